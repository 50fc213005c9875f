// models/src/identifiers.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};

/// Declares a numeric record identifier with a display prefix.
///
/// Identifiers render as `<PREFIX>-<number>` (zero padded to four digits) and
/// parse from either that form or a bare number. The prefix is matched
/// case-insensitively so `apt-12`, `APT-0012` and `12` are the same id.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new(value: u64) -> Self {
                Self(value)
            }

            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&format!("{}-{:04}", Self::PREFIX, self.0))
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> ValidationResult<Self> {
                parse_prefixed(s, Self::PREFIX).map(Self)
            }
        }
    };
}

record_id!(
    /// Identifies a patient record.
    PatientId,
    "PAT"
);
record_id!(
    /// Identifies an appointment record.
    AppointmentId,
    "APT"
);
record_id!(
    /// Identifies a prescription record.
    PrescriptionId,
    "RX"
);

fn parse_prefixed(raw: &str, prefix: &str) -> ValidationResult<u64> {
    let trimmed = raw.trim();
    let digits = match trimmed.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => trimmed[prefix.len()..].trim_start_matches('-'),
        _ => trimmed,
    };
    match digits.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ValidationError::InvalidIdentifier(raw.to_string())),
    }
}

/// A monotonic counter handing out identifier values for one collection.
///
/// Values start at 1 and never repeat within a sequence, which replaces
/// clock-derived ids and keeps record creation deterministic under test.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSequence {
    last: u64,
}

impl IdSequence {
    /// Creates a sequence whose first issued value is `last + 1`.
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    /// Returns the next value and advances the sequence.
    pub fn advance(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    /// The most recently issued value, or 0 when nothing has been issued.
    pub fn last(&self) -> u64 {
        self.last
    }
}
