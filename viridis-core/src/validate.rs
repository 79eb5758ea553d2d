// Boundary validation turning an untrusted request into a Submission.
// Invariants: all-or-nothing; the first failing field is reported.

use crate::color::Rgb;
use crate::geo::{is_valid_latitude, is_valid_longitude};
use crate::model::{SubmitRequest, Submission};
use crate::palette::Palette;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Missing color")]
    MissingColor,
    #[error("Invalid color format {0:?}; expected #RRGGBB")]
    MalformedColor(String),
    #[error("Color {0} is not in the palette")]
    NotInPalette(String),
    #[error("Missing or empty id")]
    MissingId,
    #[error("Submitter id {0:?} uses a reserved prefix")]
    ReservedId(String),
    #[error("Missing latitude")]
    MissingLatitude,
    #[error("Invalid latitude {0}; must be between -90 and 90")]
    LatitudeOutOfRange(f64),
    #[error("Missing longitude")]
    MissingLongitude,
    #[error("Invalid longitude {0}; must be between -180 and 180")]
    LongitudeOutOfRange(f64),
}

pub fn validate_submission(
    request: &SubmitRequest,
    palette: &Palette,
    now_ms: u64,
) -> Result<Submission, ValidationError> {
    let color = validate_color(request.color.as_deref(), palette)?;

    let id = match request.id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(ValidationError::MissingId),
    };

    let lat = request.lat.ok_or(ValidationError::MissingLatitude)?;
    if !is_valid_latitude(lat) {
        return Err(ValidationError::LatitudeOutOfRange(lat));
    }
    let long = request.long.ok_or(ValidationError::MissingLongitude)?;
    if !is_valid_longitude(long) {
        return Err(ValidationError::LongitudeOutOfRange(long));
    }

    Ok(Submission {
        id,
        lat,
        long,
        color,
        timestamp: now_ms,
    })
}

/// Returns the canonical uppercase hex for a palette member.
pub fn validate_color(color: Option<&str>, palette: &Palette) -> Result<String, ValidationError> {
    let color = color.ok_or(ValidationError::MissingColor)?;
    let rgb = Rgb::from_hex(color).ok_or_else(|| ValidationError::MalformedColor(color.to_string()))?;
    let hex = rgb.to_hex();
    if !palette.is_member(&hex) {
        return Err(ValidationError::NotInPalette(hex));
    }
    Ok(hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, color: &str, lat: f64, long: f64) -> SubmitRequest {
        SubmitRequest {
            id: Some(id.to_string()),
            color: Some(color.to_string()),
            lat: Some(lat),
            long: Some(long),
        }
    }

    #[test]
    fn accepts_every_palette_member_in_any_case() {
        let palette = Palette::builtin();
        for entry in palette.entries() {
            for color in [entry.hex.clone(), entry.hex.to_lowercase()] {
                let submission = validate_submission(&request("u1", &color, 10.0, 20.0), &palette, 5)
                    .expect("palette member accepted");
                assert_eq!(submission.color, entry.hex);
                assert_eq!(submission.timestamp, 5);
            }
        }
    }

    #[test]
    fn rejects_bad_color_shapes() {
        let palette = Palette::builtin();
        let cases = [
            ("FF0000", ValidationError::MalformedColor("FF0000".into())),
            ("#F00", ValidationError::MalformedColor("#F00".into())),
            ("#FF00000", ValidationError::MalformedColor("#FF00000".into())),
            ("#GG0000", ValidationError::MalformedColor("#GG0000".into())),
            ("#123456", ValidationError::NotInPalette("#123456".into())),
        ];
        for (color, expected) in cases {
            let err = validate_submission(&request("u1", color, 0.0, 0.0), &palette, 0).unwrap_err();
            assert_eq!(err, expected);
        }

        let mut missing = request("u1", "#FF0000", 0.0, 0.0);
        missing.color = None;
        assert_eq!(
            validate_submission(&missing, &palette, 0).unwrap_err(),
            ValidationError::MissingColor
        );
    }

    #[test]
    fn rejects_missing_or_empty_id() {
        let palette = Palette::builtin();
        let mut blank = request("", "#FF0000", 0.0, 0.0);
        assert_eq!(validate_submission(&blank, &palette, 0).unwrap_err(), ValidationError::MissingId);
        blank.id = Some("   ".into());
        assert_eq!(validate_submission(&blank, &palette, 0).expect("non-empty").id, "   ");
        blank.id = None;
        assert_eq!(validate_submission(&blank, &palette, 0).unwrap_err(), ValidationError::MissingId);
    }

    #[test]
    fn coordinate_bounds_are_inclusive() {
        let palette = Palette::builtin();
        for (lat, long) in [(-90.0, 0.0), (90.0, 0.0), (0.0, -180.0), (0.0, 180.0)] {
            assert!(validate_submission(&request("u1", "#FF0000", lat, long), &palette, 0).is_ok());
        }
        assert_eq!(
            validate_submission(&request("u1", "#FF0000", 91.0, 0.0), &palette, 0).unwrap_err(),
            ValidationError::LatitudeOutOfRange(91.0)
        );
        assert_eq!(
            validate_submission(&request("u1", "#FF0000", 0.0, -200.0), &palette, 0).unwrap_err(),
            ValidationError::LongitudeOutOfRange(-200.0)
        );
        assert!(matches!(
            validate_submission(&request("u1", "#FF0000", f64::NAN, 0.0), &palette, 0),
            Err(ValidationError::LatitudeOutOfRange(_))
        ));
    }

    #[test]
    fn missing_coordinates_are_reported() {
        let palette = Palette::builtin();
        let mut req = request("u1", "#FF0000", 0.0, 0.0);
        req.lat = None;
        assert_eq!(validate_submission(&req, &palette, 0).unwrap_err(), ValidationError::MissingLatitude);
        req.lat = Some(0.0);
        req.long = None;
        assert_eq!(validate_submission(&req, &palette, 0).unwrap_err(), ValidationError::MissingLongitude);
    }
}
