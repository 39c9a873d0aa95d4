use thiserror::Error;

use crate::models::question::QuestionType;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 平台 API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 考试会话错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 平台 API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// HTTP 状态码异常
    #[error("API返回错误状态 ({endpoint}): status={status}, message={message:?}")]
    BadStatus {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// 返回的 envelope 中 success=false
    #[error("API拒绝请求 ({endpoint}): {message}")]
    Rejected { endpoint: String, message: String },
    /// API 返回空结果
    #[error("API返回空结果: {endpoint}")]
    EmptyResponse { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    /// 其他错误（主要用于测试替身）
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// 是否属于可以在下一个周期自动重试的网络错误
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::RequestFailed { .. } | ApiError::EmptyResponse { .. } => true,
            ApiError::BadStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// 考试会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 答案形态与题型不匹配
    #[error("题目 {question_id} 答案形态错误 (题型: {expected}): {reason}")]
    InvalidAnswerShape {
        question_id: String,
        expected: QuestionType,
        reason: String,
    },
    /// 题目不存在
    #[error("题目不存在: {question_id}")]
    UnknownQuestion { question_id: String },
    /// 选项不存在
    #[error("题目 {question_id} 不存在选项 {option_id}")]
    UnknownOption {
        question_id: String,
        option_id: String,
    },
    /// 保存失败（自动保存或手动保存），下一个周期会重试
    #[error("保存失败: {0}")]
    TransientNetwork(#[source] ApiError),
    /// 最终提交失败，可手动重试
    #[error("提交失败: {0}")]
    Finalize(#[source] ApiError),
    /// 加载会话失败
    #[error("加载会话失败: {0}")]
    Load(#[source] ApiError),
    /// 学生已被取消资格
    #[error("已被取消考试资格: {reason}")]
    AlreadyDisqualified { reason: String },
    /// 服务器返回的会话数据不合法
    #[error("会话数据不合法: {0}")]
    InvalidSessionData(String),
    /// 会话已结束，无法再接收命令
    #[error("会话已结束")]
    SessionClosed,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl SessionError {
    /// 创建答案形态错误
    pub fn invalid_shape(
        question_id: impl Into<String>,
        expected: QuestionType,
        reason: impl Into<String>,
    ) -> Self {
        SessionError::InvalidAnswerShape {
            question_id: question_id.into(),
            expected,
            reason: reason.into(),
        }
    }
}

impl ApiError {
    /// 创建网络请求失败错误
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let err = ApiError::BadStatus {
            endpoint: "save".to_string(),
            status: 503,
            message: None,
        };
        assert!(err.is_transient());

        let err = ApiError::BadStatus {
            endpoint: "save".to_string(),
            status: 400,
            message: Some("bad".to_string()),
        };
        assert!(!err.is_transient());

        let err = ApiError::Rejected {
            endpoint: "submit".to_string(),
            message: "已提交".to_string(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_session_error_wraps_into_app_error() {
        let err: AppError = SessionError::UnknownQuestion {
            question_id: "q9".to_string(),
        }
        .into();
        assert!(err.to_string().contains("q9"));
    }
}
