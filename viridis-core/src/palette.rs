// Fixed catalog of allowed colors with membership and nearest-neighbor lookup.
// Invariants: entries are unique by uppercase hex; catalog order is stable and
// never mutated after load.

use std::collections::HashMap;

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;

const BUILTIN_NAME: &str = "Viridis Color Palette";
const BUILTIN_VERSION: &str = "1.0.0";

const BUILTIN_COLORS: [(&str, &str); 32] = [
    ("#FF0000", "Red"),
    ("#FF4500", "Orange Red"),
    ("#FF8C00", "Dark Orange"),
    ("#FFA500", "Orange"),
    ("#FFD700", "Gold"),
    ("#FFFF00", "Yellow"),
    ("#9ACD32", "Yellow Green"),
    ("#7FFF00", "Chartreuse"),
    ("#00FF00", "Green"),
    ("#00FA9A", "Medium Spring Green"),
    ("#00CED1", "Dark Turquoise"),
    ("#00BFFF", "Deep Sky Blue"),
    ("#1E90FF", "Dodger Blue"),
    ("#0000FF", "Blue"),
    ("#4169E1", "Royal Blue"),
    ("#8A2BE2", "Blue Violet"),
    ("#9370DB", "Medium Purple"),
    ("#BA55D3", "Medium Orchid"),
    ("#FF00FF", "Magenta"),
    ("#FF1493", "Deep Pink"),
    ("#FF69B4", "Hot Pink"),
    ("#DC143C", "Crimson"),
    ("#FF6347", "Tomato"),
    ("#FF7F50", "Coral"),
    ("#FFB6C1", "Light Pink"),
    ("#FFA07A", "Light Salmon"),
    ("#20B2AA", "Light Sea Green"),
    ("#87CEEB", "Sky Blue"),
    ("#7B68EE", "Medium Slate Blue"),
    ("#8B4513", "Saddle Brown"),
    ("#D2691E", "Chocolate"),
    ("#CD853F", "Peru"),
];

#[derive(Debug, thiserror::Error)]
pub enum PaletteError {
    #[error("palette json is invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("palette has no colors")]
    Empty,
    #[error("palette entry {name:?} has malformed hex {hex:?}")]
    MalformedHex { name: String, hex: String },
    #[error("palette lists {0} more than once")]
    Duplicate(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub hex: String,
    pub name: String,
}

/// Wire shape of the catalog, shared by the listing endpoint and override files.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaletteDocument {
    pub name: String,
    pub version: String,
    pub colors: Vec<PaletteEntry>,
}

#[derive(Clone, Debug)]
pub struct Palette {
    name: String,
    version: String,
    entries: Vec<PaletteEntry>,
    rgb: Vec<Rgb>,
    index: HashMap<String, usize>,
}

impl Palette {
    pub fn builtin() -> Self {
        let mut palette = Self {
            name: BUILTIN_NAME.to_string(),
            version: BUILTIN_VERSION.to_string(),
            entries: Vec::with_capacity(BUILTIN_COLORS.len()),
            rgb: Vec::with_capacity(BUILTIN_COLORS.len()),
            index: HashMap::with_capacity(BUILTIN_COLORS.len()),
        };
        for (hex, name) in BUILTIN_COLORS {
            if let Some(rgb) = Rgb::from_hex(hex) {
                palette.push(rgb, name);
            }
        }
        palette
    }

    pub fn from_json(json: &str) -> Result<Self, PaletteError> {
        let document: PaletteDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn from_document(document: PaletteDocument) -> Result<Self, PaletteError> {
        if document.colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        let mut palette = Self {
            name: document.name,
            version: document.version,
            entries: Vec::with_capacity(document.colors.len()),
            rgb: Vec::with_capacity(document.colors.len()),
            index: HashMap::with_capacity(document.colors.len()),
        };
        for entry in document.colors {
            let rgb = Rgb::from_hex(entry.hex.trim()).ok_or_else(|| PaletteError::MalformedHex {
                name: entry.name.clone(),
                hex: entry.hex.clone(),
            })?;
            if palette.index.contains_key(&rgb.to_hex()) {
                return Err(PaletteError::Duplicate(rgb.to_hex()));
            }
            palette.push(rgb, &entry.name);
        }
        Ok(palette)
    }

    fn push(&mut self, rgb: Rgb, name: &str) {
        let hex = rgb.to_hex();
        self.index.insert(hex.clone(), self.entries.len());
        self.entries.push(PaletteEntry {
            hex,
            name: name.to_string(),
        });
        self.rgb.push(rgb);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// Case-insensitive membership; accepts `#RRGGBB` only.
    pub fn is_member(&self, hex: &str) -> bool {
        self.lookup(hex).is_some()
    }

    pub fn lookup(&self, hex: &str) -> Option<&PaletteEntry> {
        let rgb = Rgb::from_hex(hex)?;
        self.index.get(&rgb.to_hex()).map(|&idx| &self.entries[idx])
    }

    /// Entry closest to `color` in RGB space. Ties go to the earlier entry.
    pub fn nearest(&self, color: Rgb) -> Option<&PaletteEntry> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in self.rgb.iter().enumerate() {
            let distance = candidate.distance(color);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((idx, distance)),
            }
        }
        best.map(|(idx, _)| &self.entries[idx])
    }

    pub fn random(&self, rng: &mut impl rand::Rng) -> Option<&PaletteEntry> {
        self.entries.choose(rng)
    }

    pub fn to_document(&self) -> PaletteDocument {
        PaletteDocument {
            name: self.name.clone(),
            version: self.version.clone(),
            colors: self.entries.clone(),
        }
    }
}
