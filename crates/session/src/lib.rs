pub mod error;
pub mod metrics;
pub mod session;
pub mod state;

pub use error::{ErrorKind, SessionError};
pub use metrics::{MetricsSnapshot, SessionMetrics};
pub use session::{Session, SessionConfig, SessionEvent, SubmitAck, text_fingerprint};
pub use state::{Phase, SessionState};
