//! Reference lists of award regions (states, provinces).
//!
//! Region files are tab-separated, one region per line:
//!
//! ```text
//! AB	Alberta
//! BC	British Columbia
//! ```
//!
//! The display name column is optional. The first blank line ends the list.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Region code of the District of Columbia, appended on request.
pub const CAPITAL_DISTRICT: &str = "DC";

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("Line {line}: missing region code in {content:?}")]
    DataFormat { line: usize, content: String },

    #[error("Line {line}: duplicate region code {code}")]
    DuplicateCode { line: usize, code: String },

    #[error("Failed to read region file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One award region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Short code as it appears in the log's `STATE` field.
    pub code: String,
    /// Human-readable name, when the reference file provides one.
    pub name: Option<String>,
}

impl Region {
    /// The name if present, otherwise the code.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.code)
    }
}

/// The canonical set of regions for one award program, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSet {
    regions: Vec<Region>,
    /// Code -> position in `regions`
    index: HashMap<String, usize>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse region file content.
    pub fn parse(content: &str) -> Result<Self, RegionError> {
        let mut set = Self::new();

        for (i, raw) in content.lines().enumerate() {
            let line_no = i + 1;
            if raw.trim().is_empty() {
                break;
            }

            let mut columns = raw.trim_end().split('\t');
            let code = columns.next().map(str::trim).unwrap_or_default();
            if code.is_empty() {
                return Err(RegionError::DataFormat {
                    line: line_no,
                    content: raw.to_string(),
                });
            }
            let name = columns
                .next()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string);

            if !set.push(Region {
                code: code.to_string(),
                name,
            }) {
                return Err(RegionError::DuplicateCode {
                    line: line_no,
                    code: code.to_string(),
                });
            }
        }

        Ok(set)
    }

    /// Load a region file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegionError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RegionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Build a set from bare codes.
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for code in codes {
            set.push(Region {
                code: code.into(),
                name: None,
            });
        }
        set
    }

    /// Append the capital district code unless it is already present.
    pub fn with_capital_district(mut self) -> Self {
        self.push(Region {
            code: CAPITAL_DISTRICT.to_string(),
            name: Some("District of Columbia".to_string()),
        });
        self
    }

    /// Append a region. Returns `false` if the code was already present.
    fn push(&mut self, region: Region) -> bool {
        if self.index.contains_key(&region.code) {
            return false;
        }
        self.index.insert(region.code.clone(), self.regions.len());
        self.regions.push(region);
        true
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<&Region> {
        self.index.get(code).map(|&i| &self.regions[i])
    }

    /// Load-order position of a code.
    pub fn position(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// All codes in load order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.code.as_str())
    }
}
