// HTTP request and response payload types.

use serde::{Deserialize, Serialize};
use viridis_core::geo::Location;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub success: bool,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "remainingTime", skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<u64>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            remaining_time: None,
        }
    }
}

/// Query string of the color endpoint. Values stay raw strings so that junk
/// input drops the proximity fields instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct ColorQuery {
    pub lat: Option<String>,
    pub long: Option<String>,
    pub radius: Option<String>,
}

impl ColorQuery {
    pub fn location(&self) -> Option<Location> {
        let lat = parse_f64(self.lat.as_deref())?;
        let long = parse_f64(self.long.as_deref())?;
        let location = Location::new(lat, long);
        location.is_valid().then_some(location)
    }

    pub fn radius_km(&self) -> Option<f64> {
        parse_f64(self.radius.as_deref()).filter(|radius| *radius > 0.0)
    }
}

fn parse_f64(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}
