//! Hierarchical taxonomy paths of the form `vertical.category.subcategory[.intent]`.
//!
//! Two shapes are parsed here:
//! - [`TaxonomyPath`] is what an ad request asks for. It is strict: 3 or 4
//!   segments, and the optional 4th segment must be a known [`IntentStage`].
//! - [`TaxonomyTarget`] is what a campaign targets. It may be any prefix of a
//!   path (1 to 4 segments), so `insurance` or `insurance.auto` are valid
//!   targets that match every more specific request beneath them.
//!
//! Both are immutable once parsed; segments are split exactly once.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MIN_PATH_SEGMENTS: usize = 3;
pub const MAX_PATH_SEGMENTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyError {
    #[error("taxonomy is empty")]
    Empty,

    #[error("taxonomy must have {min}-{max} segments, got {got}")]
    SegmentCount { got: usize, min: usize, max: usize },

    #[error("invalid taxonomy segment '{0}' (expected [a-z0-9_]+)")]
    InvalidSegment(String),

    #[error("unknown intent stage '{0}'")]
    UnknownIntent(String),
}

/// Funnel stage carried by the optional 4th segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStage {
    Research,
    Compare,
    Quote,
    Trial,
    Book,
    Apply,
    Consultation,
}

impl IntentStage {
    pub const ALL: [IntentStage; 7] = [
        IntentStage::Research,
        IntentStage::Compare,
        IntentStage::Quote,
        IntentStage::Trial,
        IntentStage::Book,
        IntentStage::Apply,
        IntentStage::Consultation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStage::Research => "research",
            IntentStage::Compare => "compare",
            IntentStage::Quote => "quote",
            IntentStage::Trial => "trial",
            IntentStage::Book => "book",
            IntentStage::Apply => "apply",
            IntentStage::Consultation => "consultation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|stage| stage.as_str() == s)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

fn split_segments(raw: &str, min: usize, max: usize) -> Result<Vec<String>, TaxonomyError> {
    if raw.is_empty() {
        return Err(TaxonomyError::Empty);
    }
    let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
    if segments.len() < min || segments.len() > max {
        return Err(TaxonomyError::SegmentCount {
            got: segments.len(),
            min,
            max,
        });
    }
    if let Some(bad) = segments.iter().find(|s| !is_valid_segment(s)) {
        return Err(TaxonomyError::InvalidSegment(bad.clone()));
    }
    Ok(segments)
}

/// A fully qualified taxonomy path requested by an ad opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaxonomyPath {
    raw: String,
    segments: Vec<String>,
    intent: Option<IntentStage>,
}

impl TaxonomyPath {
    pub fn parse(raw: &str) -> Result<Self, TaxonomyError> {
        let segments = split_segments(raw, MIN_PATH_SEGMENTS, MAX_PATH_SEGMENTS)?;
        let intent = match segments.get(3) {
            Some(stage) => Some(
                IntentStage::parse(stage)
                    .ok_or_else(|| TaxonomyError::UnknownIntent(stage.clone()))?,
            ),
            None => None,
        };
        Ok(Self {
            raw: raw.to_string(),
            segments,
            intent,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn vertical(&self) -> &str {
        &self.segments[0]
    }

    pub fn category(&self) -> &str {
        &self.segments[1]
    }

    pub fn subcategory(&self) -> &str {
        &self.segments[2]
    }

    pub fn intent(&self) -> Option<IntentStage> {
        self.intent
    }
}

impl FromStr for TaxonomyPath {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TaxonomyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A campaign's targeted taxonomy: a path or any leading prefix of one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaxonomyTarget {
    raw: String,
    segments: Vec<String>,
}

impl TaxonomyTarget {
    pub fn parse(raw: &str) -> Result<Self, TaxonomyError> {
        let segments = split_segments(raw, 1, MAX_PATH_SEGMENTS)?;
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl FromStr for TaxonomyTarget {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TaxonomyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for TaxonomyTarget {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Deserialize a list of targets, skipping malformed entries instead of
/// rejecting the whole campaign. A malformed target could never match anyway.
pub fn deserialize_targets<'de, D>(deserializer: D) -> Result<Vec<TaxonomyTarget>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(raw
        .iter()
        .filter_map(|s| match TaxonomyTarget::parse(s) {
            Ok(target) => Some(target),
            Err(e) => {
                tracing::warn!(taxonomy = %s, error = %e, "Ignoring malformed campaign taxonomy");
                None
            }
        })
        .collect())
}
