//! Contact acceptance criteria.
//!
//! A `FilterCriteria` holds the user's band/mode/satellite/callsign/grid
//! selections. The checks here are evaluated in a fixed order and the first
//! failing check rejects the contact; the region and duplicate checks live in
//! the aggregator because they depend on the running result.

use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};
use std::fmt;
use tracing::debug;

use crate::contact::{ContactRecord, field};
use crate::grid::GridDistance;
use crate::program::Program;

/// Propagation mode value marking a satellite contact.
pub const SATELLITE_PROP_MODE: &str = "SAT";

/// Contacts farther than this from the reference grid are rejected.
pub const INCLUSION_RADIUS_KM: f64 = 80.0;

/// A list of callsigns that deserializes from either a string or array.
///
/// Allows both:
/// - `callsigns = "K8DP"`
/// - `callsigns = ["K8DP", "K8DP/P"]`
///
/// Callsigns are stored upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallsignList(Vec<String>);

impl CallsignList {
    pub fn new<I, S>(calls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        CallsignList(
            calls
                .into_iter()
                .map(|c| c.as_ref().trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
        )
    }

    /// Get the callsigns as a slice.
    pub fn calls(&self) -> &[String] {
        &self.0
    }

    /// Case-insensitive membership.
    pub fn contains(&self, call: &str) -> bool {
        self.0.iter().any(|c| c.eq_ignore_ascii_case(call.trim()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Callsigns joined for display, e.g. `"K8DP, W8ABC"`.
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

impl<'de> Deserialize<'de> for CallsignList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CallsignListVisitor;

        impl<'de> Visitor<'de> for CallsignListVisitor {
            type Value = CallsignList;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or array of strings")
            }

            fn visit_str<E>(self, value: &str) -> Result<CallsignList, E>
            where
                E: de::Error,
            {
                Ok(CallsignList::new([value]))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<CallsignList, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut calls = Vec::new();
                while let Some(value) = seq.next_element::<String>()? {
                    calls.push(value);
                }
                Ok(CallsignList::new(calls))
            }
        }

        deserializer.deserialize_any(CallsignListVisitor)
    }
}

/// How satellite contacts are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SatelliteMode {
    /// Satellite and terrestrial contacts both count.
    #[default]
    NoPreference,
    /// Only contacts with `PROP_MODE` = `SAT` count.
    OnlySatellite,
    /// Only contacts with no `PROP_MODE` at all count.
    ExcludeSatellite,
}

impl SatelliteMode {
    /// Build from the `--satonly` / `--nosat` flags. `--satonly` wins if both are set.
    pub fn from_flags(sat_only: bool, no_sat: bool) -> Self {
        match (sat_only, no_sat) {
            (true, _) => SatelliteMode::OnlySatellite,
            (false, true) => SatelliteMode::ExcludeSatellite,
            (false, false) => SatelliteMode::NoPreference,
        }
    }

    /// Check a contact's propagation mode (empty when absent).
    ///
    /// Excluding satellites accepts only an empty propagation mode; other
    /// non-satellite modes (`TR`, `ES`, ...) are rejected as well.
    pub fn accepts(self, prop_mode: &str) -> bool {
        let sat_only = self == SatelliteMode::OnlySatellite;
        let no_sat = self == SatelliteMode::ExcludeSatellite;

        (prop_mode == SATELLITE_PROP_MODE && sat_only)
            || (!sat_only && !no_sat)
            || (prop_mode.is_empty() && no_sat)
    }
}

/// Why a contact was not accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// A required field is absent or malformed.
    MissingField(&'static str),
    Dxcc,
    Callsign,
    SatelliteName,
    Propagation,
    Band,
    Mode,
    /// Region not part of the program.
    UnknownRegion,
    /// Region already confirmed by an earlier contact.
    AlreadyConfirmed,
    /// Distance in km from the reference grid.
    OutOfRange(f64),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingField(name) => write!(f, "missing or invalid {}", name),
            Rejection::Dxcc => write!(f, "DXCC entity not in program"),
            Rejection::Callsign => write!(f, "station callsign not selected"),
            Rejection::SatelliteName => write!(f, "satellite name mismatch"),
            Rejection::Propagation => write!(f, "propagation mode excluded"),
            Rejection::Band => write!(f, "band mismatch"),
            Rejection::Mode => write!(f, "mode mismatch"),
            Rejection::UnknownRegion => write!(f, "region not in program"),
            Rejection::AlreadyConfirmed => write!(f, "region already confirmed"),
            Rejection::OutOfRange(km) => write!(f, "{:.1} km from reference grid", km),
        }
    }
}

/// Active filter configuration.
///
/// Empty / absent fields match everything.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Station callsigns to consider (empty = all).
    pub callsigns: CallsignList,

    /// Band to match (e.g., "20M", "70CM").
    pub band: Option<String>,

    /// Mode to match (e.g., "CW", "FT8").
    pub mode: Option<String>,

    /// Satellite name to match (e.g., "RS-44").
    pub sat_name: Option<String>,

    pub satellite: SatelliteMode,

    /// Reference grid; contacts must be within `INCLUSION_RADIUS_KM` of it.
    pub grid: Option<String>,

    /// Also track the Canadian program.
    pub include_canada: bool,
}

/// `Some(value)` only when the option holds non-blank text.
fn active(option: &Option<String>) -> Option<&str> {
    option.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl FilterCriteria {
    /// Check everything that does not depend on the running result.
    ///
    /// Checks in order: DXCC entity, station callsign, satellite name,
    /// propagation mode, band, mode.
    pub fn check_contact(
        &self,
        program: Program,
        contact: &ContactRecord,
    ) -> Result<(), Rejection> {
        let dxcc = contact
            .dxcc()
            .ok_or(Rejection::MissingField(field::DXCC))?;
        if !program.accepts_dxcc(dxcc) {
            return Err(Rejection::Dxcc);
        }

        if !self.callsigns.is_empty() {
            let station = contact
                .station_callsign()
                .ok_or(Rejection::MissingField(field::STATION_CALLSIGN))?;
            if !self.callsigns.contains(station) {
                return Err(Rejection::Callsign);
            }
        }

        if let Some(wanted) = active(&self.sat_name) {
            let sat_name = contact.sat_name().unwrap_or_default();
            if !sat_name.trim().eq_ignore_ascii_case(wanted) {
                return Err(Rejection::SatelliteName);
            }
        }

        if !self.satellite.accepts(contact.prop_mode().unwrap_or_default()) {
            return Err(Rejection::Propagation);
        }

        let band = contact
            .band()
            .ok_or(Rejection::MissingField(field::BAND))?;
        if let Some(wanted) = active(&self.band)
            && !band.trim().eq_ignore_ascii_case(wanted)
        {
            return Err(Rejection::Band);
        }

        let mode = contact
            .mode()
            .ok_or(Rejection::MissingField(field::MODE))?;
        if let Some(wanted) = active(&self.mode)
            && !mode.trim().eq_ignore_ascii_case(wanted)
        {
            return Err(Rejection::Mode);
        }

        Ok(())
    }

    /// Check the operator's grid against the reference grid.
    ///
    /// A contact without `MY_GRIDSQUARE`, or one whose distance cannot be
    /// computed, counts as zero distance.
    pub fn check_distance<D>(&self, contact: &ContactRecord, distance: &D) -> Result<(), Rejection>
    where
        D: GridDistance + ?Sized,
    {
        let Some(reference) = active(&self.grid) else {
            return Ok(());
        };

        let km = match contact.my_gridsquare() {
            Some(mine) => distance.distance_km(reference, mine).unwrap_or_else(|e| {
                debug!("Treating {} as in range: {}", contact, e);
                0.0
            }),
            None => 0.0,
        };

        if km <= INCLUSION_RADIUS_KM {
            Ok(())
        } else {
            Err(Rejection::OutOfRange(km))
        }
    }

    /// Title prefix for map exports: the selected callsigns, or blank.
    pub fn title_prefix(&self) -> String {
        self.callsigns.joined()
    }
}
