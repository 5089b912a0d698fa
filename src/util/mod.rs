//! Utility modules: redaction, timeout.

pub mod redact;
pub mod timeout;

pub use redact::mask;
pub use timeout::with_timeout;
