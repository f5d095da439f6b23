//! The two award programs this tool tracks.

use serde::Serialize;
use std::fmt;

use crate::region::Region;

/// Source tag appended to every secondary-program export row.
pub const SOURCE_TAG: &str = "LoTW";

/// An award program: which DXCC entities count and how results are labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Program {
    /// ARRL Worked All States (USA, including Alaska and Hawaii).
    Was,
    /// RAC Canada award (provinces and territories).
    Rac,
}

impl Program {
    /// DXCC entity codes that count toward this program.
    pub fn dxcc_codes(self) -> &'static [&'static str] {
        match self {
            // USA, Hawaii, Alaska
            Program::Was => &["291", "110", "6"],
            Program::Rac => &["1"],
        }
    }

    pub fn accepts_dxcc(self, dxcc: &str) -> bool {
        let dxcc = dxcc.trim();
        self.dxcc_codes().contains(&dxcc)
    }

    /// Plural noun for the program's regions, used in console output.
    pub fn region_noun(self) -> &'static str {
        match self {
            Program::Was => "States",
            Program::Rac => "Provinces",
        }
    }

    pub fn title_suffix(self) -> &'static str {
        match self {
            Program::Was => "Worked All States",
            Program::Rac => "Worked All Provinces",
        }
    }

    /// Fixed trailing column of export rows, if the program has one.
    pub fn source_tag(self) -> Option<&'static str> {
        match self {
            Program::Was => None,
            Program::Rac => Some(SOURCE_TAG),
        }
    }

    /// File name of the CSV match export.
    pub fn csv_filename(self) -> &'static str {
        match self {
            Program::Was => "waslist.csv",
            Program::Rac => "raclist.csv",
        }
    }

    /// Label a region the way the map service names its paths.
    ///
    /// US states are addressed by code; Canadian provinces by name with
    /// spaces replaced by underscores.
    pub fn map_label(self, region: &Region) -> String {
        match self {
            Program::Was => region.code.clone(),
            Program::Rac => region.label().replace(' ', "_"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Program::Was => write!(f, "WAS"),
            Program::Rac => write!(f, "RAC"),
        }
    }
}
