//! Business identifier generation.
//!
//! Every record carries a human-legible business id of the form
//! `<TAG>_<token>`, e.g. `PAT_1715776523123456`. The token is a microsecond
//! timestamp forced to be strictly increasing within the process, so rapid
//! creates never hand out the same id twice. Across processes the unique index
//! on each business id field is the backstop.
//!
//! Callers must treat the token as opaque. It is not guaranteed to be a
//! parseable timestamp.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

static LAST_TOKEN: AtomicU64 = AtomicU64::new(0);

/// The four record kinds, each with its own id tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Patient,
    Encounter,
    EcgTest,
    AuditLog,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Patient,
        RecordKind::Encounter,
        RecordKind::EcgTest,
        RecordKind::AuditLog,
    ];

    /// Tag placed in front of the token.
    pub fn prefix(self) -> &'static str {
        match self {
            RecordKind::Patient => "PAT",
            RecordKind::Encounter => "ENC",
            RecordKind::EcgTest => "ECG",
            RecordKind::AuditLog => "LOG",
        }
    }

    /// Generate a fresh business id for this kind.
    pub fn new_id(self) -> String {
        format!("{}_{}", self.prefix(), next_token())
    }

    /// Whether `id` has this kind's shape: tag, underscore, decimal digits.
    pub fn matches(self, id: &str) -> bool {
        id.strip_prefix(self.prefix())
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Next token: `max(now_micros, last + 1)`.
fn next_token() -> u64 {
    let now = u64::try_from(Utc::now().timestamp_micros()).unwrap_or(0);
    let mut prev = LAST_TOKEN.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_TOKEN.compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}
