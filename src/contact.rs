//! Data structures representing logged contacts.
//!
//! A `ContactRecord` is one ADIF record: an ordered set of upper-cased field
//! names and their raw string values. Every field lookup returns an `Option`
//! so callers decide for themselves whether a missing field is fatal for the
//! contact or simply defaults to empty.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// ADIF field names consumed by the aggregation pass.
pub mod field {
    pub const STATION_CALLSIGN: &str = "STATION_CALLSIGN";
    pub const CALL: &str = "CALL";
    pub const DXCC: &str = "DXCC";
    pub const STATE: &str = "STATE";
    pub const BAND: &str = "BAND";
    pub const MODE: &str = "MODE";
    pub const SAT_NAME: &str = "SAT_NAME";
    pub const PROP_MODE: &str = "PROP_MODE";
    pub const QSO_DATE: &str = "QSO_DATE";
    pub const TIME_ON: &str = "TIME_ON";
    pub const MY_GRIDSQUARE: &str = "MY_GRIDSQUARE";
}

/// A single logged contact.
///
/// # Example
///
/// A raw record like:
/// ```text
/// <CALL:4>W1AW <STATE:2>CT <DXCC:3>291 <BAND:3>20M <MODE:2>CW <QSO_DATE:8>20231123 <EOR>
/// ```
///
/// Would be parsed into a `ContactRecord` whose `call()` is `Some("W1AW")`,
/// `region()` is `Some("CT")` and `sat_name()` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// All fields as key-value pairs (upper-cased keys).
    fields: HashMap<String, String>,
}

impl ContactRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (k, v) in pairs {
            record.insert(k.as_ref(), v);
        }
        record
    }

    /// Insert or replace a field. The name is upper-cased.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_ascii_uppercase(), value.into());
    }

    /// Get a field value (case-insensitive lookup).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The logging station's own callsign.
    pub fn station_callsign(&self) -> Option<&str> {
        self.get(field::STATION_CALLSIGN)
    }

    /// The counterpart station's callsign.
    pub fn call(&self) -> Option<&str> {
        self.get(field::CALL)
    }

    /// DXCC entity code of the counterpart station, as written in the log.
    pub fn dxcc(&self) -> Option<&str> {
        self.get(field::DXCC)
    }

    /// State/province code of the counterpart station.
    pub fn region(&self) -> Option<&str> {
        self.get(field::STATE)
    }

    pub fn band(&self) -> Option<&str> {
        self.get(field::BAND)
    }

    pub fn mode(&self) -> Option<&str> {
        self.get(field::MODE)
    }

    pub fn sat_name(&self) -> Option<&str> {
        self.get(field::SAT_NAME)
    }

    pub fn prop_mode(&self) -> Option<&str> {
        self.get(field::PROP_MODE)
    }

    /// The operator's grid locator at the time of the contact.
    pub fn my_gridsquare(&self) -> Option<&str> {
        self.get(field::MY_GRIDSQUARE)
    }

    /// Contact date parsed from `QSO_DATE` (`YYYYMMDD`).
    pub fn date(&self) -> Option<NaiveDate> {
        self.get(field::QSO_DATE)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y%m%d").ok())
    }

    /// Contact start time parsed from `TIME_ON` (`HHMM` or `HHMMSS`).
    ///
    /// Returns `None` when the field is absent or malformed.
    pub fn time(&self) -> Option<NaiveTime> {
        let raw = self.get(field::TIME_ON)?.trim();
        match raw.len() {
            4 => NaiveTime::parse_from_str(raw, "%H%M").ok(),
            6 => NaiveTime::parse_from_str(raw, "%H%M%S").ok(),
            _ => None,
        }
    }

    /// Full contact timestamp used for chronological ordering.
    ///
    /// A missing `TIME_ON` counts as midnight; a missing or malformed
    /// `QSO_DATE` yields `None`.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let date = self.date()?;
        Some(date.and_time(self.time().unwrap_or(NaiveTime::MIN)))
    }
}

impl fmt::Display for ContactRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.call().unwrap_or("?"),
            self.region().unwrap_or("--"),
            self.band().unwrap_or("?"),
            self.mode().unwrap_or("?"),
            self.get(field::QSO_DATE).unwrap_or("????????"),
            self.get(field::TIME_ON).unwrap_or("????"),
        )
    }
}
