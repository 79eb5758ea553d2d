// Submission records and the inbound request shape they are validated from.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::geo::Location;

pub const SYNTHETIC_ID_PREFIX: &str = "idle:";

/// Untrusted body of a color submission. Every field is optional so that a
/// missing value is reported as a validation failure rather than a parse error.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SubmitRequest {
    pub id: Option<String>,
    pub color: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

/// An accepted submission. Immutable once recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub lat: f64,
    pub long: f64,
    /// Uppercase `#RRGGBB` palette member.
    pub color: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Submission {
    pub fn location(&self) -> Location {
        Location::new(self.lat, self.long)
    }

    pub fn rgb(&self) -> Option<Rgb> {
        Rgb::from_hex(&self.color)
    }

    pub fn is_synthetic(&self) -> bool {
        self.id.starts_with(SYNTHETIC_ID_PREFIX)
    }
}

/// Last known location and color of a submitter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmitterRecord {
    pub lat: f64,
    pub long: f64,
    pub color: String,
    pub timestamp: u64,
}

impl From<&Submission> for SubmitterRecord {
    fn from(submission: &Submission) -> Self {
        Self {
            lat: submission.lat,
            long: submission.long,
            color: submission.color.clone(),
            timestamp: submission.timestamp,
        }
    }
}
