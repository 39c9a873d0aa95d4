pub mod http_session_api;
pub mod memory_session_api;
pub mod session_api;

pub use http_session_api::HttpSessionApi;
pub use memory_session_api::InMemorySessionApi;
pub use session_api::{SessionApi, SubmitReceipt};
