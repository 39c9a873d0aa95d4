//! 考试应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：选择平台 API 或离线会话
//! 2. **进入考试**：检查取消资格、加入竞赛、加载会话
//! 3. **驱动会话**：协调器在独立任务中运行，控制台命令通过句柄下发
//! 4. **输出统计**：会话结束后打印最终报告
//!
//! 本层不做任何业务判断，状态转换全部交给 `SubmissionCoordinator`。

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::clients::{HttpSessionApi, InMemorySessionApi, SessionApi};
use crate::config::Config;
use crate::error::SessionError;
use crate::models::{load_offline_session, AnswerValue};
use crate::orchestrator::console::{build_answer, parse_line, ConsoleCommand, ConsoleError, USAGE};
use crate::utils::logging::{
    format_remaining, log_session_loaded, log_startup, print_final_stats, truncate_text,
};
use crate::workflow::{SessionHandle, SessionNotice, SessionReport, SubmissionCoordinator};

const OFFLINE_COMPETITION_ID: &str = "offline";

/// 应用主结构
pub struct App {
    config: Config,
    api: Arc<dyn SessionApi>,
    competition_id: String,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let (api, competition_id): (Arc<dyn SessionApi>, String) =
            match &config.offline_session_file {
                Some(path) => {
                    let data = load_offline_session(Path::new(path)).await?;
                    let competition_id = if config.competition_id.is_empty() {
                        OFFLINE_COMPETITION_ID.to_string()
                    } else {
                        config.competition_id.clone()
                    };
                    (Arc::new(InMemorySessionApi::new(data)), competition_id)
                }
                None => {
                    let api = HttpSessionApi::new(&config).context("无法创建平台客户端")?;
                    (Arc::new(api), config.competition_id.clone())
                }
            };

        log_startup(&competition_id, config.offline_session_file.is_some());

        Ok(Self {
            config,
            api,
            competition_id,
        })
    }

    /// 运行一次考试会话
    pub async fn run(&self) -> Result<SessionReport> {
        self.join().await;

        let (coordinator, handle) = SubmissionCoordinator::load(
            Arc::clone(&self.api),
            &self.competition_id,
            self.config.session_settings(),
        )
        .await
        .context("无法进入考试")?;

        log_session_loaded(
            handle.session_id(),
            handle.questions().len(),
            handle.remaining(),
        );
        info!("{}\n", USAGE);

        let notices = tokio::spawn(log_notices(handle.subscribe()));
        let session = tokio::spawn(coordinator.run());
        // 句柄交给控制台任务，stdin 关闭后随之释放
        let console = tokio::spawn(drive_from_stdin(handle));

        let report = session.await.context("会话任务异常退出")?;
        console.abort();
        notices.abort();

        print_final_stats(&report);
        Ok(report)
    }

    /// 加入竞赛，失败不阻止进入（可能已经加入）
    async fn join(&self) {
        info!("📝 加入竞赛 {}", self.competition_id);
        if let Err(e) = self.api.join_competition(&self.competition_id).await {
            warn!("加入竞赛失败（可能已加入）: {}", e);
        }
    }
}

/// 从 stdin 读取命令并下发到会话
async fn drive_from_stdin(handle: SessionHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("输入已关闭，会话将在截止时间自动提交");
                return;
            }
            Err(e) => {
                error!("读取输入失败: {}", e);
                return;
            }
        };

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(ConsoleError::Empty) => continue,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        if let Err(e) = execute(&handle, command).await {
            warn!("{}", e);
            if matches!(e, SessionError::SessionClosed) && handle.state().is_terminal() {
                return;
            }
        }
    }
}

async fn execute(
    handle: &SessionHandle,
    command: ConsoleCommand,
) -> Result<(), SessionError> {
    match command {
        ConsoleCommand::Answer { question_id, raw } => {
            let question = handle
                .question(&question_id)
                .ok_or_else(|| SessionError::UnknownQuestion {
                    question_id: question_id.clone(),
                })?;
            match build_answer(question, &raw) {
                Ok(value) => {
                    handle.set_answer(question_id.as_str(), value).await?;
                    info!("✓ 题目 {} 已作答: {}", question_id, truncate_text(&raw, 40));
                }
                Err(e) => warn!("{}", e),
            }
        }
        ConsoleCommand::Code {
            question_id,
            language,
            source,
        } => {
            handle
                .set_answer(question_id.as_str(), AnswerValue::code(language, source))
                .await?;
            info!("✓ 题目 {} 代码已保存到本地", question_id);
        }
        ConsoleCommand::Signal(signal) => {
            if !handle.signal(signal) {
                info!("诚信监控已停止，忽略 {}", signal.kind());
            }
        }
        ConsoleCommand::AllowedKey(key) => info!("按键 {} 不受限制", key),
        ConsoleCommand::Save => handle.save().await?,
        ConsoleCommand::Submit => handle.submit().await?,
        ConsoleCommand::Retry => handle.retry().await?,
        ConsoleCommand::Exit => handle.exit().await?,
        ConsoleCommand::Status => info!(
            "状态: {}，剩余时间 {}",
            handle.state(),
            format_remaining(handle.remaining())
        ),
        ConsoleCommand::Help => info!("{}", USAGE),
    }
    Ok(())
}

/// 把会话通知转换为面向学生的提示
async fn log_notices(mut notices: broadcast::Receiver<SessionNotice>) {
    loop {
        match notices.recv().await {
            Ok(notice) => log_notice(&notice),
            Err(broadcast::error::RecvError::Lagged(n)) => warn!("跳过了 {} 条通知", n),
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

fn log_notice(notice: &SessionNotice) {
    match notice {
        SessionNotice::StateChanged(_) | SessionNotice::Autosaved { .. } => {}
        SessionNotice::ViolationWarning {
            kind,
            count,
            max_warnings,
        } => warn!(
            "⚠️ 警告 {}/{}: 检测到{}，超过 {} 次将被强制提交",
            count, max_warnings, kind, max_warnings
        ),
        SessionNotice::IntegrityEscalated { kind, count } => {
            error!("🚨 {} 累计 {} 次，考试将被强制提交", kind, count)
        }
        SessionNotice::DeadlineReached => warn!("⏰ 时间到，正在自动提交"),
        SessionNotice::AutosaveFailed { message } => warn!("💾 自动保存失败: {}", message),
        SessionNotice::Saved { saved_at } => {
            info!("💾 已保存 ({})", saved_at.format("%H:%M:%S"))
        }
        SessionNotice::SaveFailed { message } => warn!("💾 保存失败: {}", message),
        SessionNotice::IncompleteAnswers { answered, total } => {
            warn!("还有 {} 题未作答 ({}/{})", total - answered, answered, total)
        }
        SessionNotice::Submitted { receipt } => match &receipt.submission_id {
            Some(id) => info!("✅ 提交成功，编号 {}", id),
            None => info!("✅ 提交成功"),
        },
        SessionNotice::SubmitFailed { message } => {
            error!("❌ 提交失败: {}，输入 retry 重试", message)
        }
    }
}
