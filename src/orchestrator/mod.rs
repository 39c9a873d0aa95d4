//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责应用生命周期和外部输入，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `exam_app` - 考试应用
//! - 选择平台 API 或离线会话
//! - 检查取消资格、加入竞赛、加载会话
//! - 启动协调器任务，把控制台命令交给会话句柄
//! - 输出最终统计
//!
//! ### `console` - 控制台命令
//! - 解析一行输入为会话操作
//! - 按题型把答案文本转换为答案值
//!
//! ## 层次关系
//!
//! ```text
//! exam_app (应用生命周期 + stdin)
//!     ↓
//! workflow::SubmissionCoordinator (一次会话的状态机)
//!     ↓
//! services (能力层：答案 / 计时 / 自动保存 / 诚信监控)
//!     ↓
//! clients (平台 API)
//! ```

pub mod console;
pub mod exam_app;

// 重新导出主要类型
pub use console::{parse_line, ConsoleCommand};
pub use exam_app::App;
