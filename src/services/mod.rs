pub mod answer_store;
pub mod autosave_pump;
pub mod integrity_monitor;
pub mod session_clock;
pub mod shortcut_rules;

pub use answer_store::AnswerStore;
pub use autosave_pump::{AutosavePump, AutosaveStats, FlushDecision, PumpEvent};
pub use integrity_monitor::{IntegrityEvent, IntegrityMonitor, MonitorState, SignalSender};
pub use session_clock::{ClockEvent, SessionClock};
pub use shortcut_rules::KeyCombo;
