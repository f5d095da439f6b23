//! waslist CLI - Worked All States / RAC lists and mapchart.net files from an ADIF log.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use waslist::{
    AggregationResult, Aggregator, CallsignList, Config, FilterCriteria, Haversine, LogSummary,
    MapDescriptor, MapKind, Program, ProgramSummary, RegionSet, SatelliteMode,
    grid::is_valid_locator, read_adif_file, write_map_descriptor, write_matches_csv,
};

/// waslist - List confirmed and needed US states (and Canadian provinces) from an ADIF log
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ADIF log, e.g. a LoTW query download
    filename: PathBuf,

    /// List only contacts made within 50 miles (80 km) of this grid
    #[arg(short, long)]
    grid: String,

    /// Station callsigns to include; all callsigns if not specified
    #[arg(short, long, num_args = 1..)]
    call: Vec<String>,

    /// Band (e.g. 20M, 2M, 70CM); all bands if not specified
    #[arg(short, long)]
    band: Option<String>,

    /// Mode (e.g. CW, SSB, FT8); all modes if not specified
    #[arg(short, long)]
    mode: Option<String>,

    /// Satellite name (e.g. RS-44, IO-117); all satellites if not specified
    #[arg(short, long)]
    sat: Option<String>,

    /// Include only satellite contacts
    #[arg(long, conflicts_with = "nosat")]
    satonly: bool,

    /// Exclude satellite contacts
    #[arg(long)]
    nosat: bool,

    /// Include Canadian provinces/territories
    #[arg(long)]
    canada: bool,

    /// Include District of Columbia
    #[arg(long)]
    dc: bool,

    /// Directory for the generated files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Config file (default: platform config dir, waslist/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Build the filter criteria, falling back to config for callsigns.
    fn criteria(&self, config: &Config) -> FilterCriteria {
        let callsigns = if self.call.is_empty() {
            config.callsigns.clone()
        } else {
            CallsignList::new(&self.call)
        };
        let upper = |value: &Option<String>| value.as_ref().map(|v| v.trim().to_ascii_uppercase());

        FilterCriteria {
            callsigns,
            band: upper(&self.band),
            mode: upper(&self.mode),
            sat_name: upper(&self.sat),
            satellite: SatelliteMode::from_flags(self.satonly, self.nosat),
            grid: Some(self.grid.trim().to_ascii_uppercase()),
            include_canada: self.canada,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    println!("WAS List - Version {}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    let criteria = args.criteria(&config);
    if !is_valid_locator(&args.grid) {
        warn!(
            "Reference grid {} is not a valid locator; no contact will be excluded by distance",
            args.grid
        );
    }

    let mut states = RegionSet::load(&config.states_file)
        .with_context(|| format!("Failed to load {}", config.states_file.display()))?;
    if args.dc {
        states = states.with_capital_district();
    }
    let provinces = if criteria.include_canada {
        Some(
            RegionSet::load(&config.provinces_file)
                .with_context(|| format!("Failed to load {}", config.provinces_file.display()))?,
        )
    } else {
        None
    };
    info!(
        "Loaded {} states{}",
        states.len(),
        provinces
            .as_ref()
            .map(|p| format!(" and {} provinces", p.len()))
            .unwrap_or_default()
    );

    println!("Reading {}", args.filename.display());
    let log = read_adif_file(&args.filename)
        .with_context(|| format!("Failed to read {}", args.filename.display()))?;
    println!("   Done.\n");

    print!("{}", LogSummary::from_contacts(&log.records));

    let aggregator = Aggregator::new(&criteria, &Haversine);
    let was = aggregator.run(Program::Was, &log.records, &states);
    println!();
    print!("{}", ProgramSummary::new(&was, &states));

    let rac = provinces
        .as_ref()
        .map(|p| (aggregator.run(Program::Rac, &log.records, p), p));
    if let Some((result, regions)) = &rac {
        println!();
        print!("{}", ProgramSummary::new(result, regions));
    }
    println!();

    if was.confirmed.is_empty() {
        println!("No states confirmed, mapchart.net file was not created!");
        return Ok(());
    }

    let output_dir = args.output_dir.clone().unwrap_or(config.output_dir);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    write_outputs(
        &output_dir,
        &criteria.title_prefix(),
        (&was, &states),
        rac.as_ref().map(|(result, regions)| (result, *regions)),
    )?;

    Ok(())
}

/// Write the CSV and map files for the primary and optional secondary program.
///
/// Returns the paths written, in order.
fn write_outputs(
    output_dir: &Path,
    title_prefix: &str,
    was: (&AggregationResult, &RegionSet),
    rac: Option<(&AggregationResult, &RegionSet)>,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let mut write_csv = |program: Program, result: &AggregationResult| -> Result<()> {
        let path = output_dir.join(program.csv_filename());
        println!("Generating {}...", path.display());
        write_matches_csv(&path, &result.matches)?;
        println!("   Done.\n");
        info!("Wrote {} rows to {}", result.matches.len(), path.display());
        written.push(path);
        Ok(())
    };
    write_csv(Program::Was, was.0)?;
    if let Some((result, _)) = rac {
        write_csv(Program::Rac, result)?;
    }

    let mut maps = vec![(
        MapKind::Usa,
        MapDescriptor::from_results(title_prefix, Program::Was.title_suffix(), &[was]),
    )];
    if let Some(rac) = rac {
        maps.push((
            MapKind::Canada,
            MapDescriptor::from_results(title_prefix, Program::Rac.title_suffix(), &[rac]),
        ));
        maps.push((
            MapKind::UsaCanada,
            MapDescriptor::from_results(title_prefix, Program::Was.title_suffix(), &[was, rac]),
        ));
    }

    println!("Generating mapchart.net files...");
    for (kind, descriptor) in maps {
        let path = output_dir.join(kind.filename());
        write_map_descriptor(&path, &descriptor)?;
        println!(
            "File {} can be uploaded to {} for map display.",
            path.display(),
            kind.upload_url()
        );
        written.push(path);
    }
    println!("   Done.\n");

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use waslist::ContactRecord;

    fn contact(dxcc: &str, state: &str) -> ContactRecord {
        ContactRecord::from_pairs([
            ("STATION_CALLSIGN", "K8DP"),
            ("DXCC", dxcc),
            ("CALL", "W1AW"),
            ("STATE", state),
            ("QSO_DATE", "20230101"),
            ("BAND", "20M"),
            ("MODE", "CW"),
        ])
    }

    #[test]
    fn test_args_build_criteria() {
        let args = Args::try_parse_from([
            "waslist", "log.adi", "-g", "en80", "-c", "k8dp", "w8abc", "-b", "2m", "--satonly",
        ])
        .unwrap();
        let criteria = args.criteria(&Config::default());

        assert_eq!(criteria.callsigns.calls(), &["K8DP", "W8ABC"]);
        assert_eq!(criteria.band.as_deref(), Some("2M"));
        assert_eq!(criteria.mode, None);
        assert_eq!(criteria.satellite, SatelliteMode::OnlySatellite);
        assert_eq!(criteria.grid.as_deref(), Some("EN80"));
        assert!(!criteria.include_canada);
    }

    #[test]
    fn test_args_callsigns_from_config() {
        let args = Args::try_parse_from(["waslist", "log.adi", "-g", "EN80"]).unwrap();
        let config = Config {
            callsigns: CallsignList::new(["K8DP"]),
            ..Default::default()
        };
        assert_eq!(args.criteria(&config).callsigns.calls(), &["K8DP"]);
    }

    #[test]
    fn test_args_require_grid() {
        assert!(Args::try_parse_from(["waslist", "log.adi"]).is_err());
    }

    #[test]
    fn test_args_require_log() {
        assert!(Args::try_parse_from(["waslist", "-g", "EN80"]).is_err());
    }

    #[test]
    fn test_args_satonly_conflicts_with_nosat() {
        assert!(
            Args::try_parse_from(["waslist", "log.adi", "-g", "EN80", "--satonly", "--nosat"])
                .is_err()
        );
    }

    #[test]
    fn test_write_outputs_primary_only() {
        let dir = tempfile::tempdir().unwrap();
        let states = RegionSet::from_codes(["OH", "MI"]);
        let criteria = FilterCriteria::default();
        let was = Aggregator::new(&criteria, &Haversine).run(
            Program::Was,
            &[contact("291", "OH")],
            &states,
        );

        let written = write_outputs(dir.path(), "", (&was, &states), None).unwrap();

        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["waslist.csv", "mapchartSave-usa.txt"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("waslist.csv")).unwrap(),
            "OH,W1AW,2023/01/01,00:00,20M,CW\r\n"
        );
    }

    #[test]
    fn test_write_outputs_with_canada() {
        let dir = tempfile::tempdir().unwrap();
        let states = RegionSet::from_codes(["OH", "MI"]);
        let provinces = RegionSet::parse("ON\tOntario\nPE\tPrince Edward Island\n").unwrap();
        let contacts = vec![contact("291", "OH"), contact("1", "PE")];
        let criteria = FilterCriteria::default();
        let aggregator = Aggregator::new(&criteria, &Haversine);
        let was = aggregator.run(Program::Was, &contacts, &states);
        let rac = aggregator.run(Program::Rac, &contacts, &provinces);

        let written = write_outputs(
            dir.path(),
            "K8DP",
            (&was, &states),
            Some((&rac, &provinces)),
        )
        .unwrap();
        assert_eq!(written.len(), 5);

        assert_eq!(
            fs::read_to_string(dir.path().join("raclist.csv")).unwrap(),
            "PE,W1AW,2023/01/01,00:00,20M,CW,LoTW\r\n"
        );

        let combined: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("mapchartSave-usa_canada.txt")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            combined["groups"]["#e0f3db"]["paths"],
            serde_json::json!(["OH", "Prince_Edward_Island"])
        );
        assert_eq!(
            combined["groups"]["#ffff33"]["paths"],
            serde_json::json!(["MI", "Ontario"])
        );
        assert_eq!(combined["title"], "K8DP Worked All States");
    }
}
