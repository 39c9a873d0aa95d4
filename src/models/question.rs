use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::SessionError;

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 单选题
    SingleChoice,
    /// 多选题
    MultiChoice,
    /// 简答题
    FreeText,
    /// 编程题
    Code,
}

impl QuestionType {
    /// 是否为选择题（带选项）
    pub fn is_choice(self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::MultiChoice)
    }

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "单选题",
            QuestionType::MultiChoice => "多选题",
            QuestionType::FreeText => "简答题",
            QuestionType::Code => "编程题",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 选择题选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

/// 考试题目
///
/// 由竞赛定义提供，会话期间只读。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// 有序选项列表，仅选择题存在
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub prompt: String,
}

impl Question {
    fn with_options(id: impl Into<String>, question_type: QuestionType, options: &[&str]) -> Self {
        Self {
            question_id: id.into(),
            question_type,
            options: options
                .iter()
                .map(|o| QuestionOption {
                    id: o.to_string(),
                    text: String::new(),
                })
                .collect(),
            points: 1,
            prompt: String::new(),
        }
    }

    /// 创建单选题
    pub fn single_choice(id: impl Into<String>, options: &[&str]) -> Self {
        Self::with_options(id, QuestionType::SingleChoice, options)
    }

    /// 创建多选题
    pub fn multi_choice(id: impl Into<String>, options: &[&str]) -> Self {
        Self::with_options(id, QuestionType::MultiChoice, options)
    }

    /// 创建简答题
    pub fn free_text(id: impl Into<String>) -> Self {
        Self::with_options(id, QuestionType::FreeText, &[])
    }

    /// 创建编程题
    pub fn code(id: impl Into<String>) -> Self {
        Self::with_options(id, QuestionType::Code, &[])
    }

    /// 是否包含指定选项
    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }

    /// 校验题目定义本身
    ///
    /// 选择题必须有选项且选项 ID 不重复，其他题型不能带选项。
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.question_id.trim().is_empty() {
            return Err(SessionError::InvalidSessionData(
                "题目ID不能为空".to_string(),
            ));
        }

        if self.question_type.is_choice() {
            if self.options.is_empty() {
                return Err(SessionError::InvalidSessionData(format!(
                    "选择题 {} 没有选项",
                    self.question_id
                )));
            }
            let mut seen = HashSet::new();
            for option in &self.options {
                if !seen.insert(option.id.as_str()) {
                    return Err(SessionError::InvalidSessionData(format!(
                        "题目 {} 选项重复: {}",
                        self.question_id, option.id
                    )));
                }
            }
        } else if !self.options.is_empty() {
            return Err(SessionError::InvalidSessionData(format!(
                "{} {} 不应包含选项",
                self.question_type, self.question_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_question_requires_options() {
        let q = Question::single_choice("q1", &[]);
        assert!(q.validate().is_err());

        let q = Question::single_choice("q1", &["A", "B"]);
        assert!(q.validate().is_ok());
        assert!(q.has_option("B"));
        assert!(!q.has_option("C"));
    }

    #[test]
    fn test_duplicate_options_rejected() {
        let q = Question::multi_choice("q2", &["A", "A"]);
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_text_question_with_options_rejected() {
        let mut q = Question::free_text("q3");
        q.options.push(QuestionOption {
            id: "A".to_string(),
            text: String::new(),
        });
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_deserialize_question() {
        let json = r#"{"questionId":"q1","type":"multi_choice","options":[{"id":"A"},{"id":"B","text":"b"}],"points":5}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.question_type, QuestionType::MultiChoice);
        assert_eq!(q.options.len(), 2);
        assert_eq!(q.points, 5);
        assert!(q.prompt.is_empty());
    }
}
