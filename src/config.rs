use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::workflow::SessionSettings;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 平台 API 配置 ---
    pub api_base_url: String,
    pub auth_token: String,
    /// 竞赛 ID
    pub competition_id: String,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 会话配置 ---
    /// 自动保存间隔（秒）
    pub autosave_interval_secs: u64,
    /// 倒计时刷新间隔（毫秒）
    pub clock_tick_millis: u64,
    /// 允许的违规警告次数，超过后强制提交
    pub max_violation_warnings: u32,
    /// 退出全屏是否立即升级
    pub fullscreen_exit_escalates: bool,
    /// 升级时是否上报取消资格
    pub report_disqualification: bool,
    /// 离线会话文件（TOML），设置后不访问平台 API
    pub offline_session_file: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            auth_token: String::new(),
            competition_id: String::new(),
            request_timeout_secs: 15,
            autosave_interval_secs: 30,
            clock_tick_millis: 1000,
            max_violation_warnings: 2,
            fullscreen_exit_escalates: false,
            report_disqualification: true,
            offline_session_file: None,
            verbose_logging: false,
        }
    }
}

/// 读取并解析环境变量，未设置时返回 None
fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// 默认配置 + 环境变量覆盖
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 加载配置：文件（若存在）→ 环境变量覆盖 → 校验
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) if p.exists() => Self::from_toml_file(p)?,
            _ => Self::default(),
        };
        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: std::env::var("EXAM_API_BASE_URL").unwrap_or(self.api_base_url),
            auth_token: std::env::var("EXAM_AUTH_TOKEN").unwrap_or(self.auth_token),
            competition_id: std::env::var("EXAM_COMPETITION_ID").unwrap_or(self.competition_id),
            request_timeout_secs: env_parse("EXAM_REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            autosave_interval_secs: env_parse("EXAM_AUTOSAVE_INTERVAL_SECS", "u64")?
                .unwrap_or(self.autosave_interval_secs),
            clock_tick_millis: env_parse("EXAM_CLOCK_TICK_MILLIS", "u64")?
                .unwrap_or(self.clock_tick_millis),
            max_violation_warnings: env_parse("EXAM_MAX_VIOLATION_WARNINGS", "u32")?
                .unwrap_or(self.max_violation_warnings),
            fullscreen_exit_escalates: env_parse("EXAM_FULLSCREEN_EXIT_ESCALATES", "bool")?
                .unwrap_or(self.fullscreen_exit_escalates),
            report_disqualification: env_parse("EXAM_REPORT_DISQUALIFICATION", "bool")?
                .unwrap_or(self.report_disqualification),
            offline_session_file: std::env::var("EXAM_OFFLINE_SESSION_FILE")
                .ok()
                .or(self.offline_session_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(self.verbose_logging),
        })
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if self.autosave_interval_secs == 0 {
            return Err(invalid("autosave_interval_secs", "必须大于 0"));
        }
        if self.clock_tick_millis == 0 {
            return Err(invalid("clock_tick_millis", "必须大于 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "必须大于 0"));
        }
        if self.offline_session_file.is_none() {
            if self.competition_id.trim().is_empty() {
                return Err(invalid("competition_id", "未设置竞赛 ID"));
            }
            if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
            {
                return Err(invalid("api_base_url", "必须以 http:// 或 https:// 开头"));
            }
        }
        Ok(())
    }

    /// 生成会话引擎配置
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            autosave_interval: Duration::from_secs(self.autosave_interval_secs),
            clock_tick: Duration::from_millis(self.clock_tick_millis),
            max_violation_warnings: self.max_violation_warnings,
            fullscreen_exit_escalates: self.fullscreen_exit_escalates,
            report_disqualification: self.report_disqualification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.autosave_interval_secs, 30);
        assert_eq!(config.max_violation_warnings, 2);
        assert!(!config.fullscreen_exit_escalates);

        let settings = config.session_settings();
        assert_eq!(settings.autosave_interval, Duration::from_secs(30));
        assert_eq!(settings.clock_tick, Duration::from_secs(1));
    }

    #[test]
    fn test_toml_partial_fields() {
        let config: Config = toml::from_str(
            r#"
            competition_id = "c-42"
            autosave_interval_secs = 10
            fullscreen_exit_escalates = true
            "#,
        )
        .unwrap();
        assert_eq!(config.competition_id, "c-42");
        assert_eq!(config.autosave_interval_secs, 10);
        assert!(config.fullscreen_exit_escalates);
        // 未写的字段使用默认值
        assert_eq!(config.clock_tick_millis, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            competition_id: "c".to_string(),
            autosave_interval_secs: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "autosave_interval_secs"
        ));

        // 在线模式必须有竞赛 ID
        assert!(Config::default().validate().is_err());

        let offline = Config {
            offline_session_file: Some("demo.toml".to_string()),
            ..Config::default()
        };
        assert!(offline.validate().is_ok());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Config::from_toml_file("/nonexistent/exam.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/exam.toml"));
    }
}
