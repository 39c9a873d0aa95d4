/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::time::Duration;
use tracing::info;

use crate::workflow::SessionReport;

/// 记录程序启动信息
///
/// # 参数
/// - `competition_id`: 竞赛 ID
/// - `offline`: 是否离线模式
pub fn log_startup(competition_id: &str, offline: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 考试会话");
    info!("📋 竞赛: {}", competition_id);
    if offline {
        info!("💾 离线模式: 答案只保存在内存中");
    }
    info!("{}", "=".repeat(60));
}

/// 记录会话加载信息
pub fn log_session_loaded(session_id: &str, questions: usize, remaining: Duration) {
    info!("✓ 会话 {} 加载完成", session_id);
    info!("📄 题目数量: {}", questions);
    info!("⏱ 剩余时间: {}\n", format_remaining(remaining));
}

/// 把剩余时间格式化为 HH:MM:SS
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// 打印最终统计信息
pub fn print_final_stats(report: &SessionReport) {
    info!("\n{}", "=".repeat(60));
    info!("📊 考试会话结束统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("会话: {}", report.session_id);
    info!("最终状态: {}", report.final_state);
    info!("✅ 已作答: {}/{}", report.answered, report.total);
    info!("⏱ 用时: {}", format_remaining(Duration::from_secs(report.time_spent_seconds)));
    info!("⚠️ 违规次数: {}", report.violations.count);
    info!(
        "💾 自动保存: 发起 {}，成功 {}，失败 {}，合并 {}",
        report.autosave.started,
        report.autosave.succeeded,
        report.autosave.failed,
        report.autosave.coalesced
    );
    if let Some(reason) = &report.forced_by {
        info!("🚨 强制提交原因: {}", reason);
    }
    if let Some(outcome) = report.disqualification {
        info!("🚫 取消资格: {}", outcome);
    }
    if let Some(receipt) = &report.receipt {
        if let Some(id) = &receipt.submission_id {
            info!("📝 提交编号: {}", id);
        }
        if let Some(score) = receipt.preliminary_score {
            info!("🎯 初步得分: {}", score);
        }
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
