//! Catalog - Tattoo Style and Body Part Vocabularies
//!
//! Wire names are lowercase. Reads are lenient: an unknown name from storage
//! or the navigation shell falls back to the documented default instead of
//! failing the whole record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TattooStyle {
    #[default]
    Realistic,
    Minimalist,
    Geometric,
    Tribal,
    Blackwork,
    Watercolor,
    Japanese,
    Traditional,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum BodyPart {
    Arm,
    Forearm,
    Shoulder,
    Back,
    Chest,
    Leg,
    Ankle,
    Wrist,
    Neck,
    Hand,
    #[default]
    Other,
}

impl TattooStyle {
    pub fn all() -> &'static [TattooStyle] {
        &[
            Self::Realistic,
            Self::Minimalist,
            Self::Geometric,
            Self::Tribal,
            Self::Blackwork,
            Self::Watercolor,
            Self::Japanese,
            Self::Traditional,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Realistic => "realistic",
            Self::Minimalist => "minimalist",
            Self::Geometric => "geometric",
            Self::Tribal => "tribal",
            Self::Blackwork => "blackwork",
            Self::Watercolor => "watercolor",
            Self::Japanese => "japanese",
            Self::Traditional => "traditional",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Realistic => "Realistic",
            Self::Minimalist => "Minimalist",
            Self::Geometric => "Geometric",
            Self::Tribal => "Tribal",
            Self::Blackwork => "Blackwork",
            Self::Watercolor => "Watercolor",
            Self::Japanese => "Japanese",
            Self::Traditional => "Traditional",
        }
    }

    /// Parse, falling back to the default for absent or unknown names.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            None => Self::default(),
            Some(name) => name.parse().unwrap_or_else(|_| {
                warn!(style = name, fallback = Self::default().as_str(), "Unknown tattoo style");
                Self::default()
            }),
        }
    }
}

impl BodyPart {
    pub fn all() -> &'static [BodyPart] {
        &[
            Self::Arm,
            Self::Forearm,
            Self::Shoulder,
            Self::Back,
            Self::Chest,
            Self::Leg,
            Self::Ankle,
            Self::Wrist,
            Self::Neck,
            Self::Hand,
            Self::Other,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Arm => "arm",
            Self::Forearm => "forearm",
            Self::Shoulder => "shoulder",
            Self::Back => "back",
            Self::Chest => "chest",
            Self::Leg => "leg",
            Self::Ankle => "ankle",
            Self::Wrist => "wrist",
            Self::Neck => "neck",
            Self::Hand => "hand",
            Self::Other => "other",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Arm => "Arm",
            Self::Forearm => "Forearm",
            Self::Shoulder => "Shoulder",
            Self::Back => "Back",
            Self::Chest => "Chest",
            Self::Leg => "Leg",
            Self::Ankle => "Ankle",
            Self::Wrist => "Wrist",
            Self::Neck => "Neck",
            Self::Hand => "Hand",
            Self::Other => "Other",
        }
    }

    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value {
            None => Self::default(),
            Some(name) => name.parse().unwrap_or_else(|_| {
                warn!(body_part = name, fallback = Self::default().as_str(), "Unknown body part");
                Self::default()
            }),
        }
    }
}

impl FromStr for TattooStyle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|style| style.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ValidationError::UnknownName {
                kind: "style",
                value: s.to_string(),
            })
    }
}

impl FromStr for BodyPart {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|part| part.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ValidationError::UnknownName {
                kind: "bodyPart",
                value: s.to_string(),
            })
    }
}

impl From<String> for TattooStyle {
    fn from(value: String) -> Self {
        Self::parse_or_default(Some(&value))
    }
}

impl From<String> for BodyPart {
    fn from(value: String) -> Self {
        Self::parse_or_default(Some(&value))
    }
}

impl fmt::Display for TattooStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
