// State payload pushed to viewers and returned by the color query.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub color: String,
    pub average: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proximity_average: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearby_count: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Proximity {
    pub average: String,
    pub nearby_count: usize,
}

impl StateSnapshot {
    pub fn new(color: String, average: String, proximity: Option<Proximity>) -> Self {
        let (proximity_average, nearby_count) = match proximity {
            Some(proximity) => (Some(proximity.average), Some(proximity.nearby_count)),
            None => (None, None),
        };
        Self {
            color,
            average,
            proximity_average,
            nearby_count,
        }
    }
}
