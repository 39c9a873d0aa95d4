//! 禁用快捷键规则
//!
//! 把键盘组合映射为违规类型，规则表在编译期生成

use phf::phf_map;

use crate::models::violation::ViolationKind;

/// Ctrl/Cmd + 键 的禁用组合（键名统一为小写）
static CTRL_SHORTCUTS: phf::Map<&'static str, ViolationKind> = phf_map! {
    "c" => ViolationKind::Clipboard,
    "v" => ViolationKind::Clipboard,
    "x" => ViolationKind::Clipboard,
    "p" => ViolationKind::Print,
    "s" => ViolationKind::SavePage,
    "t" => ViolationKind::NewWindow,
    "n" => ViolationKind::NewWindow,
    "tab" => ViolationKind::TabSwitchShortcut,
};

/// 键盘组合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyCombo {
    pub key: String,
    /// Ctrl 或 Cmd
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyCombo {
    /// 解析形如 `ctrl+shift+i`、`alt+tab`、`F12` 的组合
    pub fn parse(input: &str) -> Option<Self> {
        let mut combo = KeyCombo::default();
        for part in input.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "" => return None,
                "ctrl" | "control" | "cmd" | "meta" => combo.ctrl = true,
                "shift" => combo.shift = true,
                "alt" | "option" => combo.alt = true,
                key => {
                    if !combo.key.is_empty() {
                        return None;
                    }
                    combo.key = key.to_string();
                }
            }
        }
        if combo.key.is_empty() {
            None
        } else {
            Some(combo)
        }
    }
}

/// 判断键盘组合是否属于禁用操作
pub fn classify(combo: &KeyCombo) -> Option<ViolationKind> {
    let key = combo.key.as_str();

    if key == "f12" || (combo.ctrl && combo.shift && key == "i") {
        return Some(ViolationKind::DevTools);
    }
    if combo.alt && key == "tab" {
        return Some(ViolationKind::TabSwitchShortcut);
    }
    if combo.ctrl {
        return CTRL_SHORTCUTS.get(key).copied();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_str(input: &str) -> Option<ViolationKind> {
        KeyCombo::parse(input).as_ref().and_then(classify)
    }

    #[test]
    fn test_prohibited_shortcuts() {
        assert_eq!(classify_str("F12"), Some(ViolationKind::DevTools));
        assert_eq!(classify_str("ctrl+shift+I"), Some(ViolationKind::DevTools));
        assert_eq!(classify_str("alt+tab"), Some(ViolationKind::TabSwitchShortcut));
        assert_eq!(classify_str("cmd+tab"), Some(ViolationKind::TabSwitchShortcut));
        assert_eq!(classify_str("ctrl+V"), Some(ViolationKind::Clipboard));
        assert_eq!(classify_str("ctrl+p"), Some(ViolationKind::Print));
        assert_eq!(classify_str("Ctrl+S"), Some(ViolationKind::SavePage));
        assert_eq!(classify_str("ctrl+n"), Some(ViolationKind::NewWindow));
    }

    #[test]
    fn test_allowed_keys() {
        assert_eq!(classify_str("a"), None);
        assert_eq!(classify_str("shift+c"), None);
        assert_eq!(classify_str("ctrl+z"), None);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(KeyCombo::parse("ctrl+").is_none());
        assert!(KeyCombo::parse("ctrl+shift").is_none());
        assert!(KeyCombo::parse("a+b").is_none());
    }
}
