//! The confirmation pass: which regions a log confirms for a program.
//!
//! Contacts are visited oldest first. The first accepted contact for a region
//! confirms it and becomes that region's export row; later contacts for the
//! same region are ignored.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::contact::{ContactRecord, field};
use crate::filter::{FilterCriteria, Rejection, SATELLITE_PROP_MODE};
use crate::grid::GridDistance;
use crate::program::Program;
use crate::region::RegionSet;

/// Insertion-ordered set of region codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl OrderedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Returns `false` if it was already present.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.seen.contains(&value) {
            return false;
        }
        self.seen.insert(value.clone());
        self.items.push(value);
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.seen.contains(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Values in insertion order.
    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Values in alphabetical order.
    pub fn sorted(&self) -> Vec<String> {
        let mut sorted = self.items.clone();
        sorted.sort();
        sorted
    }
}

/// One exported row: the contact that confirmed a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRow {
    pub region: String,
    /// Counterpart callsign.
    pub call: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Band, or the satellite name for satellite contacts.
    pub band_label: String,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_tag: Option<&'static str>,
}

impl MatchRow {
    /// CSV columns: region, call, date, time, band, mode[, source].
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![
            self.region.clone(),
            self.call.clone(),
            self.date.format("%Y/%m/%d").to_string(),
            self.time.format("%H:%M").to_string(),
            self.band_label.clone(),
            self.mode.clone(),
        ];
        if let Some(tag) = self.source_tag {
            columns.push(tag.to_string());
        }
        columns
    }
}

/// Result of one program's pass.
#[derive(Debug, Clone)]
pub struct AggregationResult {
    pub program: Program,
    /// Confirmed region codes in the order they were confirmed.
    pub confirmed: OrderedSet,
    /// Unconfirmed region codes in region-file order.
    pub needed: Vec<String>,
    /// One row per confirmed region, in export order.
    pub matches: Vec<MatchRow>,
    /// Size of the region universe.
    pub total_regions: usize,
}

impl AggregationResult {
    pub fn confirmed_sorted(&self) -> Vec<String> {
        self.confirmed.sorted()
    }

    pub fn is_complete(&self) -> bool {
        self.needed.is_empty()
    }
}

/// Stable chronological ordering; contacts without a usable date go last.
pub fn chronological(contacts: &[ContactRecord]) -> Vec<&ContactRecord> {
    let mut ordered: Vec<&ContactRecord> = contacts.iter().collect();
    ordered.sort_by_cached_key(|c| {
        let ts: Option<NaiveDateTime> = c.timestamp();
        (ts.is_none(), ts)
    });
    ordered
}

/// Runs the confirmation pass with a fixed set of criteria.
pub struct Aggregator<'a, D: GridDistance + ?Sized> {
    criteria: &'a FilterCriteria,
    distance: &'a D,
}

impl<'a, D: GridDistance + ?Sized> Aggregator<'a, D> {
    pub fn new(criteria: &'a FilterCriteria, distance: &'a D) -> Self {
        Self { criteria, distance }
    }

    /// Compute confirmed/needed/matches for `program` over `contacts`.
    pub fn run(
        &self,
        program: Program,
        contacts: &[ContactRecord],
        regions: &RegionSet,
    ) -> AggregationResult {
        let mut confirmed = OrderedSet::new();
        let mut matches = Vec::new();

        for contact in chronological(contacts) {
            match self.evaluate(program, contact, regions, &confirmed) {
                Ok(row) => {
                    debug!("{} confirms {}: {}", program, row.region, contact);
                    confirmed.insert(row.region.clone());
                    matches.push(row);
                }
                Err(rejection) => debug!("{} skips {}: {}", program, contact, rejection),
            }
        }

        match program {
            Program::Was => matches.sort_by(|a, b| a.region.cmp(&b.region)),
            Program::Rac => matches.sort_by_key(|row| regions.position(&row.region)),
        }

        let needed = regions
            .codes()
            .filter(|code| !confirmed.contains(code))
            .map(str::to_string)
            .collect();

        AggregationResult {
            program,
            confirmed,
            needed,
            matches,
            total_regions: regions.len(),
        }
    }

    /// Decide one contact, producing its export row on acceptance.
    fn evaluate(
        &self,
        program: Program,
        contact: &ContactRecord,
        regions: &RegionSet,
        confirmed: &OrderedSet,
    ) -> Result<MatchRow, Rejection> {
        self.criteria.check_contact(program, contact)?;

        let region = contact
            .region()
            .ok_or(Rejection::MissingField(field::STATE))?
            .trim();
        if !regions.contains(region) {
            return Err(Rejection::UnknownRegion);
        }
        if confirmed.contains(region) {
            return Err(Rejection::AlreadyConfirmed);
        }

        self.criteria.check_distance(contact, self.distance)?;

        let call = contact
            .call()
            .ok_or(Rejection::MissingField(field::CALL))?;
        let date = contact
            .date()
            .ok_or(Rejection::MissingField(field::QSO_DATE))?;
        let time = contact.time().unwrap_or(NaiveTime::MIN);

        // Both were checked by the criteria
        let band = contact.band().unwrap_or_default();
        let mode = contact.mode().unwrap_or_default();

        let band_label = if contact.prop_mode() == Some(SATELLITE_PROP_MODE) {
            contact
                .sat_name()
                .ok_or(Rejection::MissingField(field::SAT_NAME))?
        } else {
            band
        };

        Ok(MatchRow {
            region: region.to_string(),
            call: call.trim().to_string(),
            date,
            time,
            band_label: band_label.trim().to_string(),
            mode: mode.trim().to_string(),
            source_tag: program.source_tag(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{CallsignList, SatelliteMode};
    use crate::grid::{GridError, Haversine};

    struct FixedDistance(f64);

    impl GridDistance for FixedDistance {
        fn distance_km(&self, _from: &str, _to: &str) -> Result<f64, GridError> {
            Ok(self.0)
        }
    }

    fn states() -> RegionSet {
        RegionSet::from_codes(["OH", "CA", "MI", "CT"])
    }

    fn provinces() -> RegionSet {
        RegionSet::parse("ON\tOntario\nQC\tQuebec\nBC\tBritish Columbia\n").unwrap()
    }

    fn qso(dxcc: &str, state: &str, date: &str, time: &str, band: &str, mode: &str) -> ContactRecord {
        let call = format!("W{}X", state);
        ContactRecord::from_pairs([
            ("STATION_CALLSIGN", "K8DP"),
            ("CALL", call.as_str()),
            ("DXCC", dxcc),
            ("STATE", state),
            ("QSO_DATE", date),
            ("TIME_ON", time),
            ("BAND", band),
            ("MODE", mode),
        ])
    }

    fn run(criteria: &FilterCriteria, program: Program, contacts: &[ContactRecord], regions: &RegionSet) -> AggregationResult {
        Aggregator::new(criteria, &Haversine).run(program, contacts, regions)
    }

    #[test]
    fn test_ordered_set() {
        let mut set = OrderedSet::new();
        assert!(set.insert("OH"));
        assert!(set.insert("CA"));
        assert!(!set.insert("OH"));
        assert_eq!(set.as_slice(), &["OH", "CA"]);
        assert_eq!(set.sorted(), vec!["CA", "OH"]);
        assert!(set.contains("CA"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_duplicate_region_first_contact_wins() {
        let contacts = vec![
            qso("291", "CA", "20230101", "1200", "20M", "CW"),
            qso("291", "CA", "20230201", "1200", "40M", "SSB"),
        ];
        let result = run(&FilterCriteria::default(), Program::Was, &contacts, &states());

        assert_eq!(result.confirmed.as_slice(), &["CA"]);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].band_label, "20M");
        assert_eq!(result.matches[0].mode, "CW");
        assert_eq!(result.matches[0].date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(result.needed, vec!["OH", "MI", "CT"]);
    }

    #[test]
    fn test_earliest_contact_wins_regardless_of_log_order() {
        let contacts = vec![
            qso("291", "CA", "20230201", "1200", "40M", "SSB"),
            qso("291", "CA", "20230101", "1200", "20M", "CW"),
        ];
        let result = run(&FilterCriteria::default(), Program::Was, &contacts, &states());
        assert_eq!(result.matches[0].band_label, "20M");
    }

    #[test]
    fn test_same_timestamp_keeps_log_order() {
        let contacts = vec![
            qso("291", "CA", "20230101", "1200", "15M", "FT8"),
            qso("291", "CA", "20230101", "1200", "20M", "CW"),
        ];
        let result = run(&FilterCriteria::default(), Program::Was, &contacts, &states());
        assert_eq!(result.matches[0].band_label, "15M");
    }

    #[test]
    fn test_time_breaks_same_day() {
        let contacts = vec![
            qso("291", "OH", "20230101", "2300", "15M", "FT8"),
            qso("291", "OH", "20230101", "0100", "20M", "CW"),
        ];
        let result = run(&FilterCriteria::default(), Program::Was, &contacts, &states());
        assert_eq!(result.matches[0].band_label, "20M");
        assert_eq!(result.matches[0].time, NaiveTime::from_hms_opt(1, 0, 0).unwrap());
    }

    #[test]
    fn test_rejected_contact_does_not_block_later_one() {
        let criteria = FilterCriteria {
            band: Some("40M".to_string()),
            ..Default::default()
        };
        let contacts = vec![
            qso("291", "MI", "20230101", "1200", "20M", "CW"),
            qso("291", "MI", "20230301", "1200", "40M", "CW"),
        ];
        let result = run(&criteria, Program::Was, &contacts, &states());
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].band_label, "40M");
    }

    #[test]
    fn test_matches_sorted_by_region_code() {
        let contacts = vec![
            qso("291", "OH", "20230101", "1200", "20M", "CW"),
            qso("291", "CT", "20230102", "1200", "20M", "CW"),
            qso("110", "CA", "20230103", "1200", "20M", "CW"),
        ];
        let result = run(&FilterCriteria::default(), Program::Was, &contacts, &states());

        assert_eq!(result.confirmed.as_slice(), &["OH", "CT", "CA"]);
        let regions: Vec<_> = result.matches.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(regions, vec!["CA", "CT", "OH"]);
        assert_eq!(result.confirmed_sorted(), vec!["CA", "CT", "OH"]);
        assert_eq!(result.needed, vec!["MI"]);
    }

    #[test]
    fn test_rac_matches_in_region_file_order() {
        let contacts = vec![
            qso("1", "BC", "20230101", "1200", "20M", "CW"),
            qso("1", "ON", "20230102", "1200", "20M", "CW"),
        ];
        let result = run(&FilterCriteria::default(), Program::Rac, &contacts, &provinces());

        let regions: Vec<_> = result.matches.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(regions, vec!["ON", "BC"]);
        assert_eq!(result.needed, vec!["QC"]);
        assert_eq!(result.matches[0].source_tag, Some("LoTW"));
        assert_eq!(
            result.matches[0].columns(),
            vec!["ON", "WONX", "2023/01/02", "12:00", "20M", "CW", "LoTW"]
        );
    }

    #[test]
    fn test_programs_are_independent() {
        let contacts = vec![
            qso("291", "OH", "20230101", "1200", "20M", "CW"),
            qso("1", "ON", "20230102", "1200", "20M", "CW"),
        ];
        let was = run(&FilterCriteria::default(), Program::Was, &contacts, &states());
        let rac = run(&FilterCriteria::default(), Program::Rac, &contacts, &provinces());
        assert_eq!(was.confirmed.as_slice(), &["OH"]);
        assert_eq!(rac.confirmed.as_slice(), &["ON"]);
    }

    #[test]
    fn test_region_outside_program_ignored() {
        let contacts = vec![qso("291", "DC", "20230101", "1200", "20M", "CW")];
        let result = run(&FilterCriteria::default(), Program::Was, &contacts, &states());
        assert!(result.confirmed.is_empty());

        let with_dc = states().with_capital_district();
        let result = run(&FilterCriteria::default(), Program::Was, &contacts, &with_dc);
        assert_eq!(result.confirmed.as_slice(), &["DC"]);
    }

    #[test]
    fn test_satellite_band_label() {
        let criteria = FilterCriteria {
            satellite: SatelliteMode::OnlySatellite,
            ..Default::default()
        };
        let mut sat = qso("291", "OH", "20230101", "1200", "2M", "FM");
        sat.insert("PROP_MODE", "SAT");
        sat.insert("SAT_NAME", "SO-50");
        let terrestrial = qso("291", "MI", "20230101", "1300", "20M", "CW");

        let result = run(&criteria, Program::Was, &[sat, terrestrial], &states());
        assert_eq!(result.confirmed.as_slice(), &["OH"]);
        assert_eq!(result.matches[0].band_label, "SO-50");
    }

    #[test]
    fn test_satellite_without_name_skipped() {
        let mut sat = qso("291", "OH", "20230101", "1200", "2M", "FM");
        sat.insert("PROP_MODE", "SAT");
        let result = run(&FilterCriteria::default(), Program::Was, &[sat], &states());
        assert!(result.confirmed.is_empty());
    }

    #[test]
    fn test_missing_required_fields_skip_only_that_contact() {
        let no_state = ContactRecord::from_pairs([
            ("DXCC", "291"),
            ("CALL", "W1AW"),
            ("QSO_DATE", "20230101"),
            ("BAND", "20M"),
            ("MODE", "CW"),
        ]);
        let mut bad_date = qso("291", "OH", "2023-01-01", "1200", "20M", "CW");
        bad_date.insert("QSO_DATE", "garbage");
        let good = qso("291", "OH", "20230301", "1200", "20M", "CW");

        let result = run(&FilterCriteria::default(), Program::Was, &[no_state, bad_date, good], &states());
        assert_eq!(result.confirmed.as_slice(), &["OH"]);
        assert_eq!(result.matches[0].date, NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
    }

    #[test]
    fn test_grid_radius() {
        let criteria = FilterCriteria {
            grid: Some("EN80".to_string()),
            ..Default::default()
        };
        let mut contact = qso("291", "OH", "20230101", "1200", "20M", "CW");
        contact.insert("MY_GRIDSQUARE", "EN82");
        let contacts = vec![contact];

        let far = Aggregator::new(&criteria, &FixedDistance(200.0)).run(Program::Was, &contacts, &states());
        assert!(far.confirmed.is_empty());
        assert_eq!(far.needed.len(), 4);

        let near = Aggregator::new(&criteria, &FixedDistance(79.9)).run(Program::Was, &contacts, &states());
        assert_eq!(near.confirmed.as_slice(), &["OH"]);
    }

    #[test]
    fn test_out_of_range_contact_does_not_block_later_in_range_one() {
        let criteria = FilterCriteria {
            grid: Some("EN80".to_string()),
            ..Default::default()
        };
        let mut away = qso("291", "OH", "20230101", "1200", "20M", "CW");
        away.insert("MY_GRIDSQUARE", "FN20");
        let mut home = qso("291", "OH", "20230201", "1200", "40M", "CW");
        home.insert("MY_GRIDSQUARE", "EN80");

        let result = run(&criteria, Program::Was, &[away, home], &states());
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].band_label, "40M");
    }

    #[test]
    fn test_callsign_filter_with_no_match() {
        let criteria = FilterCriteria {
            callsigns: CallsignList::new(["N0BODY"]),
            ..Default::default()
        };
        let contacts = vec![qso("291", "OH", "20230101", "1200", "20M", "CW")];
        let result = run(&criteria, Program::Was, &contacts, &states());
        assert!(result.confirmed.is_empty());
        assert!(result.matches.is_empty());
        assert_eq!(result.needed, vec!["OH", "CA", "MI", "CT"]);
    }

    #[test]
    fn test_missing_time_is_midnight() {
        let contact = ContactRecord::from_pairs([
            ("DXCC", "291"),
            ("CALL", "W1AW"),
            ("STATE", "CT"),
            ("QSO_DATE", "20230101"),
            ("BAND", "20M"),
            ("MODE", "CW"),
        ]);
        let result = run(&FilterCriteria::default(), Program::Was, &[contact], &states());
        assert_eq!(
            result.matches[0].columns(),
            vec!["CT", "W1AW", "2023/01/01", "00:00", "20M", "CW"]
        );
    }

    #[test]
    fn test_complete() {
        let regions = RegionSet::from_codes(["OH"]);
        let contacts = vec![qso("291", "OH", "20230101", "1200", "20M", "CW")];
        let result = run(&FilterCriteria::default(), Program::Was, &contacts, &regions);
        assert!(result.is_complete());
        assert_eq!(result.total_regions, 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_rejection_logged_at_debug() {
        let captured = CapturedLog::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let contacts = vec![
            qso("291", "OH", "20230101", "1200", "40M", "CW"),
            qso("291", "ZZ", "20230102", "1200", "20M", "CW"),
        ];
        let criteria = FilterCriteria {
            band: Some("20M".to_string()),
            ..Default::default()
        };
        tracing::subscriber::with_default(subscriber, || {
            run(&criteria, Program::Was, &contacts, &states());
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().filter(|l| l.contains("skips")).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.contains("DEBUG")));
        assert!(lines[0].contains(&Rejection::Band.to_string()));
        assert!(lines[1].contains(&Rejection::UnknownRegion.to_string()));
    }
}
