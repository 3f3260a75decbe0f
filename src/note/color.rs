use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::NoteError;

/// An opaque `#RRGGBB` note colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl NoteColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (case-insensitive).
    pub fn from_hex(hex: &str) -> Result<Self, NoteError> {
        let invalid = || NoteError::format("colorHex", hex);

        let digits = hex.trim().strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Palette entry with this exact colour, if any.
    pub fn palette(self) -> Option<Palette> {
        Palette::ALL.into_iter().find(|p| p.color() == self)
    }
}

impl Default for NoteColor {
    fn default() -> Self {
        Palette::Red.color()
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for NoteColor {
    type Err = NoteError;

    /// Accepts a palette name as well as a hex string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Palette::from_name(s) {
            Some(palette) => Ok(palette.color()),
            None => Self::from_hex(s),
        }
    }
}

impl Serialize for NoteColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for NoteColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The six colours offered by the colour picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Palette {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl Palette {
    pub const ALL: [Palette; 6] = [
        Palette::Red,
        Palette::Orange,
        Palette::Yellow,
        Palette::Green,
        Palette::Blue,
        Palette::Purple,
    ];

    pub const fn color(self) -> NoteColor {
        match self {
            Palette::Red => NoteColor::rgb(0xD2, 0x0A, 0x2E),
            Palette::Orange => NoteColor::rgb(0xFF, 0x96, 0x4F),
            Palette::Yellow => NoteColor::rgb(0xFF, 0xDD, 0x3C),
            Palette::Green => NoteColor::rgb(0x00, 0xBB, 0x77),
            Palette::Blue => NoteColor::rgb(0xA8, 0xB5, 0xE0),
            Palette::Purple => NoteColor::rgb(0xB1, 0x9C, 0xD9),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Palette::Red => "red",
            Palette::Orange => "orange",
            Palette::Yellow => "yellow",
            Palette::Green => "green",
            Palette::Blue => "blue",
            Palette::Purple => "purple",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Next entry in picker order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Entry after `color` in picker order. Off-palette colours start at red.
    pub fn after(color: NoteColor) -> Self {
        match color.palette() {
            Some(p) => p.next(),
            None => Palette::Red,
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
