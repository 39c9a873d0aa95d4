use crate::models::question::Question;
use crate::models::session::SessionData;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 离线会话文件
///
/// 截止时间不写在文件里，加载时按 `duration_seconds` 从当前时刻起算。
#[derive(Debug, Deserialize)]
struct OfflineSession {
    session_id: String,
    #[serde(default)]
    student_id: String,
    duration_seconds: u64,
    questions: Vec<Question>,
}

/// 解析离线会话 TOML 文本
pub fn parse_offline_session(content: &str) -> Result<SessionData> {
    let offline: OfflineSession = toml::from_str(content).context("无法解析离线会话")?;

    if offline.questions.is_empty() {
        anyhow::bail!("离线会话没有题目");
    }
    let duration = i64::try_from(offline.duration_seconds).context("考试时长过大")?;

    Ok(SessionData {
        session_id: offline.session_id,
        student_id: offline.student_id,
        deadline: Utc::now() + chrono::Duration::seconds(duration),
        duration_seconds: offline.duration_seconds,
        questions: offline.questions,
        saved_answers: Vec::new(),
    })
}

/// 从 TOML 文件加载离线会话
pub async fn load_offline_session(toml_file_path: &Path) -> Result<SessionData> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let data = parse_offline_session(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    tracing::info!(
        "成功加载离线会话 {}，共 {} 个题目",
        data.session_id,
        data.questions.len()
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;

    const SAMPLE: &str = r#"
session_id = "offline-1"
duration_seconds = 600

[[questions]]
questionId = "q1"
type = "single_choice"
prompt = "2 + 2 = ?"
options = [{ id = "a", text = "3" }, { id = "b", text = "4" }]

[[questions]]
questionId = "q2"
type = "code"
points = 5
"#;

    #[test]
    fn test_parse_offline_session() {
        let before = Utc::now();
        let data = parse_offline_session(SAMPLE).unwrap();

        assert_eq!(data.session_id, "offline-1");
        assert_eq!(data.questions.len(), 2);
        assert_eq!(data.questions[0].question_type, QuestionType::SingleChoice);
        assert_eq!(data.questions[0].options.len(), 2);
        assert_eq!(data.questions[1].points, 5);
        assert!(data.deadline >= before + chrono::Duration::seconds(600));
    }

    #[test]
    fn test_rejects_session_without_questions() {
        let result = parse_offline_session("session_id = \"x\"\nduration_seconds = 60\nquestions = []\n");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = load_offline_session(Path::new("/nonexistent/session.toml"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("无法读取TOML文件"));
    }
}
