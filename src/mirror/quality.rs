//! Quality labels and their selection priority.

use std::fmt;

/// Priority assigned to labels outside the known set.
pub const UNKNOWN_QUALITY_PRIORITY: u8 = 5;

/// Resolution label attached to a mirror.
///
/// Known labels rank 1080p > 720p > 480p > 360p; anything else ranks last.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QualityLabel {
    /// `1080p`
    P1080,
    /// `720p`
    P720,
    /// `480p`
    P480,
    /// `360p`
    P360,
    /// Unrecognized label, kept verbatim.
    Other(String),
}

impl QualityLabel {
    /// Parses a label, ignoring surrounding whitespace and ASCII case.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "1080p" => Self::P1080,
            "720p" => Self::P720,
            "480p" => Self::P480,
            "360p" => Self::P360,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Selection priority; lower is better.
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Self::P1080 => 1,
            Self::P720 => 2,
            Self::P480 => 3,
            Self::P360 => 4,
            Self::Other(_) => UNKNOWN_QUALITY_PRIORITY,
        }
    }

    /// The label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::P360 => "360p",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
