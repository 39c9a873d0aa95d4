//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化日志，默认 info 级别，`RUST_LOG` 优先
pub fn init() {
    init_with_verbose(false);
}

/// 初始化日志，`verbose` 为 true 时默认 debug 级别
///
/// 重复调用不会报错（测试中多次初始化）。
pub fn init_with_verbose(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
