//! # Exam Session
//!
//! 在线考试客户端的会话引擎：答案存储、倒计时、自动保存、诚信监控与一次性提交
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 平台 API 协作者，只暴露能力
//! - `SessionApi` - 获取会话、保存、提交、取消资格上报
//! - `HttpSessionApi` / `InMemorySessionApi` - HTTP 与内存实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，彼此独立
//! - `AnswerStore` - 答案校验与快照
//! - `SessionClock` - 基于截止时间的倒计时
//! - `AutosavePump` - 定期保存，合并重叠请求
//! - `IntegrityMonitor` - 违规计数与升级
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次考试会话"的完整生命周期
//! - `SubmissionCoordinator` - 状态机 + 副作用，保证最终提交只发起一次
//! - `SessionHandle` - 命令与通知
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/exam_app` - 应用生命周期与控制台输入
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{HttpSessionApi, InMemorySessionApi, SessionApi, SubmitReceipt};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Answer, AnswerValue, PlatformSignal, Question, SessionData, SessionState};
pub use orchestrator::App;
pub use workflow::{
    SessionHandle, SessionNotice, SessionReport, SessionSettings, SubmissionCoordinator,
};
