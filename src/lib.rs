//! waslist - Worked All States and RAC Canada progress from an ADIF log.
//!
//! This crate provides:
//! - A nom-based ADIF parser producing key/value contact records
//! - Region reference lists (US states, Canadian provinces)
//! - The confirmation pass: filter contacts, keep the earliest contact per
//!   region, and split each program into confirmed and needed regions
//! - CSV and mapchart.net exports of the result
//!
//! # Example
//!
//! ```rust
//! use waslist::{Aggregator, FilterCriteria, Haversine, Program, RegionSet, parse_adif};
//!
//! let log = parse_adif(
//!     "<DXCC:3>291<STATE:2>OH<CALL:4>W8AA<BAND:3>20M<MODE:2>CW<QSO_DATE:8>20231123<EOR>",
//! )
//! .expect("Failed to parse log");
//! let states = RegionSet::from_codes(["OH", "MI"]);
//!
//! let criteria = FilterCriteria::default();
//! let result = Aggregator::new(&criteria, &Haversine).run(Program::Was, &log.records, &states);
//!
//! assert_eq!(result.confirmed.as_slice(), &["OH"]);
//! assert_eq!(result.needed, vec!["MI"]);
//! ```

pub mod adif;
pub mod aggregate;
pub mod config;
pub mod contact;
pub mod export;
pub mod filter;
pub mod grid;
pub mod program;
pub mod region;
pub mod summary;

pub use adif::{AdifLog, ParseError, parse_adif, read_adif_file};
pub use aggregate::{AggregationResult, Aggregator, MatchRow, OrderedSet};
pub use config::Config;
pub use contact::ContactRecord;
pub use export::{ExportError, MapDescriptor, MapKind, write_map_descriptor, write_matches_csv};
pub use filter::{CallsignList, FilterCriteria, Rejection, SatelliteMode};
pub use grid::{GridDistance, GridError, Haversine};
pub use program::Program;
pub use region::{Region, RegionError, RegionSet};
pub use summary::{LogSummary, ProgramSummary};
