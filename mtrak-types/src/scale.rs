use serde::{Deserialize, Serialize};

/// Scales available for note entry. Serialized as the integer id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "usize", try_from = "usize")]
pub enum Scale {
    #[default]
    Major,
    NaturalMinor,
    HarmonicMinor,
    MelodicMinor,
    Pentatonic,
    WholeTone,
    Octatonic,
}

impl Scale {
    pub const ALL: [Scale; 7] = [
        Scale::Major,
        Scale::NaturalMinor,
        Scale::HarmonicMinor,
        Scale::MelodicMinor,
        Scale::Pentatonic,
        Scale::WholeTone,
        Scale::Octatonic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scale::Major => "major",
            Scale::NaturalMinor => "natural minor",
            Scale::HarmonicMinor => "harmonic minor",
            Scale::MelodicMinor => "melodic minor",
            Scale::Pentatonic => "pentatonic",
            Scale::WholeTone => "whole tone",
            Scale::Octatonic => "octatonic",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Scale::Major => "M",
            Scale::NaturalMinor => "m",
            Scale::HarmonicMinor => "hm",
            Scale::MelodicMinor => "mm",
            Scale::Pentatonic => "p",
            Scale::WholeTone => "w",
            Scale::Octatonic => "o",
        }
    }

    /// Semitone offsets of each degree from the root.
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            Scale::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            Scale::Pentatonic => &[0, 2, 4, 7, 9],
            Scale::WholeTone => &[0, 2, 4, 6, 8, 10],
            Scale::Octatonic => &[0, 2, 3, 5, 6, 8, 9, 11],
        }
    }

    pub fn len(&self) -> usize {
        self.intervals().len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn id(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn from_id(id: usize) -> Option<Scale> {
        Self::ALL.get(id).copied()
    }

    pub fn next(&self) -> Scale {
        Self::ALL[(self.id() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Scale {
        Self::ALL[(self.id() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl From<Scale> for usize {
    fn from(scale: Scale) -> usize {
        scale.id()
    }
}

impl TryFrom<usize> for Scale {
    type Error = String;

    fn try_from(id: usize) -> Result<Self, Self::Error> {
        Scale::from_id(id).ok_or_else(|| format!("invalid scale id: {}", id))
    }
}
