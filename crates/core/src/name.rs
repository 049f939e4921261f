//! Artifact filename grammar.
//!
//! Stored filenames follow the convention `<owner>_<kind>_<date>.<ext>`,
//! where `kind` is one of the closed [`RecordKind`] tags and `date` is a
//! `YYYY-MM-DD` calendar date (optional sign, month 01-12, day 01-31; the
//! check is textual, not a real-calendar check). The convention is an
//! implicit state encoding, so it is parsed once into an explicit
//! [`ArtifactName`] value instead of being re-matched at every use site.

use crate::{CoreError, CoreResult};
use regex::Regex;
use std::sync::OnceLock;

const NAME_PATTERN: &str = r"^([^_]+)_([^_]+)_(.+)\.([^.]+)$";
const DATE_PATTERN: &str = r"^[+-]?\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$";

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NAME_PATTERN).expect("name pattern is valid"))
}

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATE_PATTERN).expect("date pattern is valid"))
}

/// The record kinds a filename may encode.
///
/// This enum is deliberately *closed* so kind handling stays exhaustive at
/// compile time; the wire form is the lowercase tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Person,
    Company,
}

impl RecordKind {
    /// Every kind, in tag order.
    pub const ALL: [RecordKind; 2] = [RecordKind::Person, RecordKind::Company];

    /// Returns the lowercase tag embedded in filenames.
    pub fn tag(&self) -> &'static str {
        match self {
            RecordKind::Person => "person",
            RecordKind::Company => "company",
        }
    }

    /// Parses a tag back into a kind; the match is case-sensitive.
    pub fn from_tag(tag: &str) -> Option<RecordKind> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Parsed view of a stored artifact filename.
///
/// Reconstructing the filename via [`ArtifactName::file_name`] reproduces
/// the original string exactly, so the date segment is kept verbatim rather
/// than being re-rendered through a date type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    owner: String,
    kind: RecordKind,
    date: String,
    extension: String,
}

impl ArtifactName {
    /// Parses and validates a filename against the naming convention.
    ///
    /// A name containing a parent-directory sequence is rejected before any
    /// grammar matching as `CoreError::PathTraversal`; that is a storage
    /// safety violation, distinct from the plain `CoreError::InvalidName`
    /// returned for a grammar, kind, or date mismatch.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::PathTraversal` for names containing `..` and
    /// `CoreError::InvalidName` for anything else that fails the grammar.
    pub fn parse(name: &str) -> CoreResult<Self> {
        if name.contains("..") {
            return Err(CoreError::PathTraversal(name.to_owned()));
        }

        let caps = name_regex()
            .captures(name)
            .ok_or_else(|| CoreError::InvalidName(name.to_owned()))?;

        let kind = RecordKind::from_tag(&caps[2])
            .ok_or_else(|| CoreError::InvalidName(name.to_owned()))?;

        if !date_regex().is_match(&caps[3]) {
            return Err(CoreError::InvalidName(name.to_owned()));
        }

        Ok(Self {
            owner: caps[1].to_owned(),
            kind,
            date: caps[3].to_owned(),
            extension: caps[4].to_owned(),
        })
    }

    /// Returns the owner segment (the part before the kind tag).
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the record kind embedded in the name.
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Returns the validated date segment, verbatim.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Returns the final extension, without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Reconstructs the original filename from the parsed fields.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.{}",
            self.owner,
            self.kind.tag(),
            self.date,
            self.extension
        )
    }
}
