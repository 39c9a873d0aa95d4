pub mod toml_loader;

pub use toml_loader::{load_offline_session, parse_offline_session};
