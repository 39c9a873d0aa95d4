use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::question::QuestionType;

/// 答案值
///
/// 按题型区分的 tagged union，形态校验在 `AnswerStore` 边界完成。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerValue {
    SingleChoice {
        selected: Option<String>,
    },
    MultiChoice {
        #[serde(default)]
        selected: BTreeSet<String>,
    },
    FreeText {
        #[serde(default)]
        text: String,
    },
    Code {
        #[serde(default)]
        source: String,
        #[serde(default)]
        language: String,
    },
}

impl AnswerValue {
    /// 指定题型的空答案
    pub fn empty_for(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::SingleChoice => AnswerValue::SingleChoice { selected: None },
            QuestionType::MultiChoice => AnswerValue::MultiChoice {
                selected: BTreeSet::new(),
            },
            QuestionType::FreeText => AnswerValue::FreeText {
                text: String::new(),
            },
            QuestionType::Code => AnswerValue::Code {
                source: String::new(),
                language: String::new(),
            },
        }
    }

    pub fn single(option_id: impl Into<String>) -> Self {
        AnswerValue::SingleChoice {
            selected: Some(option_id.into()),
        }
    }

    pub fn multi<I, S>(option_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnswerValue::MultiChoice {
            selected: option_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        AnswerValue::FreeText { text: text.into() }
    }

    pub fn code(language: impl Into<String>, source: impl Into<String>) -> Self {
        AnswerValue::Code {
            source: source.into(),
            language: language.into(),
        }
    }

    /// 答案值对应的题型
    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerValue::SingleChoice { .. } => QuestionType::SingleChoice,
            AnswerValue::MultiChoice { .. } => QuestionType::MultiChoice,
            AnswerValue::FreeText { .. } => QuestionType::FreeText,
            AnswerValue::Code { .. } => QuestionType::Code,
        }
    }

    /// 是否为未作答
    ///
    /// 未选择、空集合、空白文本都算未作答。
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::SingleChoice { selected } => selected.is_none(),
            AnswerValue::MultiChoice { selected } => selected.is_empty(),
            AnswerValue::FreeText { text } => text.trim().is_empty(),
            AnswerValue::Code { source, .. } => source.trim().is_empty(),
        }
    }
}

/// 单题答案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub value: AnswerValue,
    /// 从未修改过的空答案为 None
    #[serde(default)]
    pub last_modified_at: Option<DateTime<Utc>>,
}

impl Answer {
    /// 创建空答案
    pub fn empty(question_id: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            question_id: question_id.into(),
            value: AnswerValue::empty_for(question_type),
            last_modified_at: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        !self.value.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emptiness_rules() {
        assert!(AnswerValue::empty_for(QuestionType::SingleChoice).is_empty());
        assert!(AnswerValue::empty_for(QuestionType::MultiChoice).is_empty());
        assert!(AnswerValue::text("   ").is_empty());
        assert!(AnswerValue::code("python", "\n").is_empty());

        assert!(!AnswerValue::single("A").is_empty());
        assert!(!AnswerValue::multi(["A"]).is_empty());
        assert!(!AnswerValue::text("x").is_empty());
        assert!(!AnswerValue::code("cpp", "int main(){}").is_empty());
    }

    #[test]
    fn test_tagged_serialization() {
        let value = AnswerValue::multi(["B", "A"]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["kind"], "multi_choice");
        // BTreeSet 保证选项有序
        assert_eq!(json["selected"], serde_json::json!(["A", "B"]));

        let parsed: AnswerValue =
            serde_json::from_str(r#"{"kind":"single_choice","selected":null}"#).unwrap();
        assert_eq!(parsed, AnswerValue::empty_for(QuestionType::SingleChoice));
    }
}
