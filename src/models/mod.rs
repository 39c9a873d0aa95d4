pub mod answer;
pub mod checkpoint;
pub mod loaders;
pub mod question;
pub mod session;
pub mod violation;

pub use answer::{Answer, AnswerValue};
pub use checkpoint::Checkpoint;
pub use loaders::load_offline_session;
pub use question::{Question, QuestionOption, QuestionType};
pub use session::{Session, SessionData, SessionRef, SessionState};
pub use violation::{PlatformSignal, ViolationKind, ViolationRecord};
