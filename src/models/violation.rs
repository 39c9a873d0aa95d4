use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 违规类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// 页面被隐藏（切换标签页或窗口）
    TabHidden,
    /// 窗口失去焦点
    FocusLost,
    /// 退出全屏
    FullscreenExit,
    /// 尝试打开开发者工具
    DevTools,
    /// 使用切换标签页的快捷键
    TabSwitchShortcut,
    /// 复制、粘贴、剪切
    Clipboard,
    /// 右键菜单
    ContextMenu,
    /// 打印页面
    Print,
    /// 保存页面
    SavePage,
    /// 打开新标签页或新窗口
    NewWindow,
}

impl ViolationKind {
    /// 违规描述
    pub fn description(self) -> &'static str {
        match self {
            ViolationKind::TabHidden => "检测到切换标签页或窗口",
            ViolationKind::FocusLost => "考试窗口失去焦点",
            ViolationKind::FullscreenExit => "考试期间退出全屏",
            ViolationKind::DevTools => "尝试打开开发者工具",
            ViolationKind::TabSwitchShortcut => "尝试使用快捷键切换标签页",
            ViolationKind::Clipboard => "尝试复制或粘贴内容",
            ViolationKind::ContextMenu => "尝试使用右键菜单",
            ViolationKind::Print => "尝试打印页面",
            ViolationKind::SavePage => "尝试保存页面",
            ViolationKind::NewWindow => "尝试打开新标签页或新窗口",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// 平台信号
///
/// 由宿主环境（浏览器、桌面壳等）投递给 `IntegrityMonitor`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformSignal {
    VisibilityHidden,
    FocusLost,
    FullscreenExited,
    /// 被禁止的操作（快捷键、剪贴板、右键菜单等）
    Prohibited(ViolationKind),
}

impl PlatformSignal {
    pub fn kind(self) -> ViolationKind {
        match self {
            PlatformSignal::VisibilityHidden => ViolationKind::TabHidden,
            PlatformSignal::FocusLost => ViolationKind::FocusLost,
            PlatformSignal::FullscreenExited => ViolationKind::FullscreenExit,
            PlatformSignal::Prohibited(kind) => kind,
        }
    }
}

/// 违规记录
///
/// 同一会话内只增不减，新会话开始时重新创建。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    pub count: u32,
    pub last_violation_at: Option<DateTime<Utc>>,
    /// 最近一次违规的类型
    pub kind: Option<ViolationKind>,
}

impl ViolationRecord {
    pub(crate) fn record(&mut self, kind: ViolationKind, at: DateTime<Utc>) {
        self.count += 1;
        self.last_violation_at = Some(at);
        self.kind = Some(kind);
    }
}
