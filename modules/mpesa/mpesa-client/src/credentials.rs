use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Layout of the `Timestamp` field: `YYYYMMDDHHMMSS`.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Current local time formatted as `YYYYMMDDHHMMSS`.
#[must_use]
pub fn generate_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// STK push password: base64 of shortcode, passkey and timestamp concatenated.
#[must_use]
pub fn encode_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{shortcode}{passkey}{timestamp}"))
}

/// Source of the timestamps injected into outgoing payloads.
pub trait Clock: Send + Sync {
    fn timestamp(&self) -> String;
}

/// Wall clock, local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn timestamp(&self) -> String {
        generate_timestamp()
    }
}

/// Always reports the same timestamp.
#[derive(Debug, Clone)]
pub struct FixedClock(String);

impl FixedClock {
    #[must_use]
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self(timestamp.into())
    }
}

impl Clock for FixedClock {
    fn timestamp(&self) -> String {
        self.0.clone()
    }
}
