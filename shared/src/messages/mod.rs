//! Message types exchanged between harness processes
//!
//! - `readiness`: fixture server → orchestrator startup report

pub mod readiness;

pub use readiness::{read_message, send_message, ReadinessMessage, ServerInfo, MAX_FRAME_LEN};
