use std::fmt;
use std::str::FromStr;

use crate::error::{NoteError, NoteResult};
use crate::note::NoteId;
use crate::note::document::FIELD_COLOR;

/// Root of the note namespace. Shopping notes and to-do lists share it.
pub const NOTES_ROOT: &str = "notes";

const FORBIDDEN: [char; 5] = ['.', '#', '$', '[', ']'];

/// A validated hierarchical store path such as `notes/note1/colorHex`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    pub fn parse(raw: &str) -> NoteResult<Self> {
        let invalid = || NoteError::InvalidPath {
            path: raw.to_string(),
        };

        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            if segment.is_empty() || segment.contains(FORBIDDEN) {
                return Err(invalid());
            }
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// `notes/{id}`
    pub fn note(id: &NoteId) -> NoteResult<Self> {
        Self::parse(&format!("{NOTES_ROOT}/{id}")).and_then(|path| {
            if path.segments.len() == 2 {
                Ok(path)
            } else {
                Err(NoteError::InvalidPath {
                    path: path.to_string(),
                })
            }
        })
    }

    /// `notes/{id}/colorHex`
    pub fn note_color(id: &NoteId) -> NoteResult<Self> {
        Ok(Self::note(id)?.child(FIELD_COLOR))
    }

    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The top-level document this path lives in (`root/key`), if deep enough.
    pub fn document(&self) -> Option<StorePath> {
        (self.segments.len() >= 2).then(|| Self {
            segments: self.segments[..2].to_vec(),
        })
    }

    /// Segments below the owning document.
    pub fn within_document(&self) -> &[String] {
        self.segments.get(2..).unwrap_or(&[])
    }

    pub fn is_ancestor_of(&self, other: &StorePath) -> bool {
        other.segments.len() >= self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// Whether a write at one path changes the value seen at the other.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for StorePath {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
