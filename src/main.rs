use anyhow::Result;
use exam_session::{logger, App, Config, SessionState};
use std::path::Path;

const CONFIG_FILE: &str = "exam-session.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（文件可选，环境变量覆盖）
    let config = Config::load(Some(Path::new(CONFIG_FILE)))?;

    // 初始化日志
    logger::init_with_verbose(config.verbose_logging);

    // 初始化并运行应用
    let report = App::initialize(config).await?.run().await?;

    if report.final_state == SessionState::Failed {
        anyhow::bail!("提交失败，答案未能送达");
    }
    Ok(())
}
