//! 流程层（Workflow Layer）
//!
//! 定义"一次考试会话"的完整生命周期：
//! 加载 → 答题（自动保存 / 计时 / 诚信监控）→ 提交 → 结束
//!
//! - `state_machine` - 纯状态转换函数，不做 IO
//! - `submission_coordinator` - 持有全部组件的 actor，执行状态转换的副作用
//! - `session_handle` - 外部控制端（命令 + 通知订阅）
//! - `session_ctx` - 日志前缀

pub mod session_ctx;
pub mod session_handle;
pub mod state_machine;
pub mod submission_coordinator;

pub use session_ctx::SessionCtx;
pub use session_handle::{SessionCommand, SessionHandle, SessionNotice};
pub use state_machine::{transition, Effect, SessionEvent, Transition};
pub use submission_coordinator::{
    DisqualificationReport, ForcedReason, SessionReport, SessionSettings, SubmissionCoordinator,
};
