//! Console summaries of a run.

use std::fmt;

use crate::aggregate::{AggregationResult, OrderedSet};
use crate::contact::ContactRecord;
use crate::region::RegionSet;

/// What the log itself contains, before any filtering.
#[derive(Debug, Clone, Default)]
pub struct LogSummary {
    /// Total records read.
    pub records: usize,
    /// Distinct station callsigns, upper-cased, in first-seen order.
    pub callsigns: OrderedSet,
}

impl LogSummary {
    pub fn from_contacts(contacts: &[ContactRecord]) -> Self {
        let mut callsigns = OrderedSet::new();
        for call in contacts.iter().filter_map(ContactRecord::station_callsign) {
            callsigns.insert(call.trim().to_ascii_uppercase());
        }
        Self {
            records: contacts.len(),
            callsigns,
        }
    }
}

impl fmt::Display for LogSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Callsigns found in log: {}", self.callsigns.len())?;
        for call in self.callsigns.iter() {
            writeln!(f, "    {}", call)?;
        }
        writeln!(f, "Records in log: {}", self.records)
    }
}

/// Confirmed and needed regions for one program.
pub struct ProgramSummary<'a> {
    pub result: &'a AggregationResult,
    pub regions: &'a RegionSet,
}

impl<'a> ProgramSummary<'a> {
    pub fn new(result: &'a AggregationResult, regions: &'a RegionSet) -> Self {
        Self { result, regions }
    }

    /// `CODE` or `CODE (Name)` when the region file has a name.
    fn describe(&self, code: &str) -> String {
        match self.regions.get(code).and_then(|r| r.name.as_deref()) {
            Some(name) => format!("{} ({})", code, name),
            None => code.to_string(),
        }
    }
}

impl fmt::Display for ProgramSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = self.result.program.region_noun();

        writeln!(f, "{} Confirmed: {}", noun, self.result.confirmed.len())?;
        for code in self.result.confirmed_sorted() {
            writeln!(f, "    {}", self.describe(&code))?;
        }

        writeln!(f, "{} Needed: {}", noun, self.result.needed.len())?;
        for code in &self.result.needed {
            writeln!(f, "    {}", self.describe(code))?;
        }

        Ok(())
    }
}
