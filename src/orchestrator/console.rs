//! 控制台命令解析
//!
//! 把 stdin 的一行文本解析为会话操作，答案文本按题型转换为 `AnswerValue`

use thiserror::Error;

use crate::models::{AnswerValue, PlatformSignal, Question, QuestionType, ViolationKind};
use crate::services::shortcut_rules::{classify, KeyCombo};

pub const USAGE: &str = "\
可用命令:
  answer <题号> <答案>          单选填选项ID，多选用逗号分隔，'-' 清空
  code <题号> <语言> <源码>     源码中的 \\n 表示换行
  hidden | blur | fullscreen-exit | copy | paste | contextmenu
  key <组合键>                  例如 ctrl+c、alt+tab、F12
  save | submit | retry | exit | status | help";

/// 控制台命令
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Answer { question_id: String, raw: String },
    Code {
        question_id: String,
        language: String,
        source: String,
    },
    Signal(PlatformSignal),
    /// 不属于禁用操作的按键
    AllowedKey(String),
    Save,
    Submit,
    Retry,
    Exit,
    Status,
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("空命令")]
    Empty,
    #[error("未知命令: {0}")]
    UnknownCommand(String),
    #[error("用法: {0}")]
    Usage(&'static str),
    #[error("无法识别的组合键: {0}")]
    BadKey(String),
    #[error("题目 {0} 是编程题，请使用 code 命令")]
    UseCodeCommand(String),
}

/// 解析一行输入
pub fn parse_line(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "" => return Err(ConsoleError::Empty),
        "answer" => {
            let (question_id, raw) = rest
                .split_once(char::is_whitespace)
                .map(|(q, r)| (q, r.trim()))
                .unwrap_or((rest, ""));
            if question_id.is_empty() {
                return Err(ConsoleError::Usage("answer <题号> <答案>"));
            }
            ConsoleCommand::Answer {
                question_id: question_id.to_string(),
                raw: raw.to_string(),
            }
        }
        "code" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let (Some(question_id), Some(language)) = (parts.next(), parts.next()) else {
                return Err(ConsoleError::Usage("code <题号> <语言> <源码>"));
            };
            if question_id.is_empty() || language.is_empty() {
                return Err(ConsoleError::Usage("code <题号> <语言> <源码>"));
            }
            ConsoleCommand::Code {
                question_id: question_id.to_string(),
                language: language.to_string(),
                source: unescape(parts.next().unwrap_or("").trim()),
            }
        }
        "hidden" => ConsoleCommand::Signal(PlatformSignal::VisibilityHidden),
        "blur" => ConsoleCommand::Signal(PlatformSignal::FocusLost),
        "fullscreen-exit" => ConsoleCommand::Signal(PlatformSignal::FullscreenExited),
        "copy" | "paste" | "cut" => {
            ConsoleCommand::Signal(PlatformSignal::Prohibited(ViolationKind::Clipboard))
        }
        "contextmenu" => ConsoleCommand::Signal(PlatformSignal::Prohibited(ViolationKind::ContextMenu)),
        "key" => {
            let combo = KeyCombo::parse(rest).ok_or_else(|| ConsoleError::BadKey(rest.to_string()))?;
            match classify(&combo) {
                Some(kind) => ConsoleCommand::Signal(PlatformSignal::Prohibited(kind)),
                None => ConsoleCommand::AllowedKey(rest.to_string()),
            }
        }
        "save" => ConsoleCommand::Save,
        "submit" => ConsoleCommand::Submit,
        "retry" => ConsoleCommand::Retry,
        "exit" | "quit" => ConsoleCommand::Exit,
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        other => return Err(ConsoleError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

/// 按题型把答案文本转换为答案值
pub fn build_answer(question: &Question, raw: &str) -> Result<AnswerValue, ConsoleError> {
    let raw = raw.trim();
    let cleared = raw.is_empty() || raw == "-";

    let value = match question.question_type {
        _ if cleared && question.question_type != QuestionType::Code => {
            AnswerValue::empty_for(question.question_type)
        }
        QuestionType::SingleChoice => AnswerValue::single(raw),
        QuestionType::MultiChoice => AnswerValue::multi(
            raw.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty()),
        ),
        QuestionType::FreeText => AnswerValue::text(unescape(raw)),
        QuestionType::Code => return Err(ConsoleError::UseCodeCommand(question.question_id.clone())),
    };
    Ok(value)
}

/// 处理 `\n`、`\t` 与 `\\` 转义
fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_line("answer q1 b").unwrap(),
            ConsoleCommand::Answer {
                question_id: "q1".to_string(),
                raw: "b".to_string()
            }
        );
        assert_eq!(
            parse_line("  hidden ").unwrap(),
            ConsoleCommand::Signal(PlatformSignal::VisibilityHidden)
        );
        assert_eq!(parse_line("SUBMIT").unwrap(), ConsoleCommand::Submit);
        assert_eq!(parse_line("").unwrap_err(), ConsoleError::Empty);
        assert!(matches!(
            parse_line("dance"),
            Err(ConsoleError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_parse_code_keeps_spaces_and_unescapes() {
        let cmd = parse_line(r"code q3 rust fn main() {\n    println!();\n}").unwrap();
        assert_eq!(
            cmd,
            ConsoleCommand::Code {
                question_id: "q3".to_string(),
                language: "rust".to_string(),
                source: "fn main() {\n    println!();\n}".to_string(),
            }
        );
        assert!(matches!(parse_line("code q3"), Err(ConsoleError::Usage(_))));
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!(
            parse_line("key ctrl+shift+i").unwrap(),
            ConsoleCommand::Signal(PlatformSignal::Prohibited(ViolationKind::DevTools))
        );
        assert_eq!(
            parse_line("key ctrl+z").unwrap(),
            ConsoleCommand::AllowedKey("ctrl+z".to_string())
        );
        assert!(matches!(parse_line("key ctrl+"), Err(ConsoleError::BadKey(_))));
    }

    #[test]
    fn test_build_answer_by_type() {
        let single = Question::single_choice("q1", &["a", "b"]);
        assert_eq!(build_answer(&single, "b").unwrap(), AnswerValue::single("b"));
        assert!(build_answer(&single, "-").unwrap().is_empty());

        let multi = Question::multi_choice("q2", &["a", "b", "c"]);
        assert_eq!(
            build_answer(&multi, "c, a,").unwrap(),
            AnswerValue::multi(["a", "c"])
        );

        let text = Question::free_text("q3");
        assert_eq!(
            build_answer(&text, r"line1\nline2").unwrap(),
            AnswerValue::text("line1\nline2")
        );

        let code = Question::code("q4");
        assert_eq!(
            build_answer(&code, "x").unwrap_err(),
            ConsoleError::UseCodeCommand("q4".to_string())
        );
    }
}
