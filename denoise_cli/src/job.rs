use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use denoising::{Backend, ImageRange, NonLocalMeansParams, StackInfo};
use serde::{Deserialize, Serialize};

/// Slice selection as written on the command line or in a job file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeSpec {
    Named(NamedRange),
    Slices { first: usize, last: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedRange {
    Current,
    All,
}

impl Default for RangeSpec {
    fn default() -> Self {
        RangeSpec::Named(NamedRange::Current)
    }
}

impl RangeSpec {
    pub fn resolve(&self, image: &impl StackInfo) -> denoising::Result<ImageRange> {
        match *self {
            RangeSpec::Named(NamedRange::Current) => Ok(ImageRange::current_slice(image)),
            RangeSpec::Named(NamedRange::All) => Ok(ImageRange::all_slices(image)),
            RangeSpec::Slices { first, last } => ImageRange::explicit(image, first, last),
        }
    }
}

impl FromStr for RangeSpec {
    type Err = String;

    /// `current`, `all`, `N` or `FIRST-LAST`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "current" => return Ok(RangeSpec::Named(NamedRange::Current)),
            "all" => return Ok(RangeSpec::Named(NamedRange::All)),
            _ => {}
        }

        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| format!("'{}' is not a range, expected current, all, N or FIRST-LAST", s))
        };
        match s.split_once('-') {
            Some((first, last)) => Ok(RangeSpec::Slices {
                first: parse(first)?,
                last: parse(last)?,
            }),
            None => {
                let index = parse(s)?;
                Ok(RangeSpec::Slices {
                    first: index,
                    last: index,
                })
            }
        }
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeSpec::Named(NamedRange::Current) => write!(f, "current"),
            RangeSpec::Named(NamedRange::All) => write!(f, "all"),
            RangeSpec::Slices { first, last } => write!(f, "{}-{}", first, last),
        }
    }
}

/// YAML job description. Every field is optional.
///
/// ```yaml
/// backend: vulkan
/// range: { first: 1, last: 3 }
/// nlm:
///   h: 1.5
/// pass_through_unselected: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobFile {
    pub backend: Option<Backend>,
    pub fallback: Option<Backend>,
    pub staging_dir: Option<PathBuf>,
    pub verbose: bool,
    pub range: Option<RangeSpec>,
    pub nlm: NonLocalMeansParams,
    pub pass_through_unselected: bool,
    pub title: Option<String>,
}

impl JobFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read job file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid job file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yml::from_str(text)?)
    }
}
