// Global and proximity-weighted color averaging over the recent window.
// Invariants: inputs are ascending by timestamp; outputs are palette members.

use crate::color::Rgb;
use crate::geo::Location;
use crate::model::Submission;
use crate::palette::{Palette, PaletteEntry};

/// Keeps the newest `limit` submissions, preserving ascending order.
pub fn latest_window(submissions: &[Submission], limit: usize) -> &[Submission] {
    let start = submissions.len().saturating_sub(limit);
    &submissions[start..]
}

/// Arithmetic mean of each channel. `None` when nothing parses.
pub fn mean_color(submissions: &[Submission]) -> Option<Rgb> {
    weighted_mean(submissions.iter().filter_map(|s| s.rgb().map(|rgb| (rgb, 1.0))))
}

/// Weight of a submission `distance_km` away: 1 at the query point, strictly
/// decreasing and never zero.
pub fn proximity_weight(distance_km: f64) -> f64 {
    1.0 / (1.0 + distance_km * distance_km)
}

/// Distance-weighted mean of the submissions within `radius_km` of `origin`.
/// `None` when no submission is in range.
pub fn proximity_mean(submissions: &[Submission], origin: &Location, radius_km: f64) -> Option<Rgb> {
    weighted_mean(submissions.iter().filter_map(|submission| {
        let distance = origin.distance_km(&submission.location());
        if distance > radius_km {
            return None;
        }
        submission.rgb().map(|rgb| (rgb, proximity_weight(distance)))
    }))
}

pub fn nearby_count(submissions: &[Submission], origin: &Location, radius_km: f64) -> usize {
    submissions
        .iter()
        .filter(|submission| origin.distance_km(&submission.location()) <= radius_km)
        .count()
}

/// Snapped global average, or `None` for an empty window.
pub fn global_average<'p>(window: &[Submission], palette: &'p Palette) -> Option<&'p PaletteEntry> {
    mean_color(window).and_then(|rgb| palette.nearest(rgb))
}

/// Snapped proximity average, or `None` when nothing is within range.
pub fn proximity_average<'p>(
    window: &[Submission],
    origin: &Location,
    radius_km: f64,
    palette: &'p Palette,
) -> Option<&'p PaletteEntry> {
    proximity_mean(window, origin, radius_km).and_then(|rgb| palette.nearest(rgb))
}

fn weighted_mean(samples: impl Iterator<Item = (Rgb, f64)>) -> Option<Rgb> {
    let (mut r, mut g, mut b, mut total) = (0.0, 0.0, 0.0, 0.0);
    for (rgb, weight) in samples {
        r += f64::from(rgb.r) * weight;
        g += f64::from(rgb.g) * weight;
        b += f64::from(rgb.b) * weight;
        total += weight;
    }
    if total <= 0.0 {
        return None;
    }
    Some(Rgb::from_channels(r / total, g / total, b / total))
}
