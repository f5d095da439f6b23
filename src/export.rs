//! Output files: CSV match lists and mapchart.net save files.
//!
//! Every file is rewritten from scratch on each run.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::aggregate::{AggregationResult, MatchRow};
use crate::region::RegionSet;

const CONFIRMED_LABEL: &str = "Confirmed LoTW";
const NEEDED_LABEL: &str = "Needed";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn create(path: &Path) -> Result<BufWriter<File>, ExportError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Write match rows as headerless CSV.
pub fn write_matches_csv(path: impl AsRef<Path>, rows: &[MatchRow]) -> Result<(), ExportError> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_writer(create(path)?);

    for row in rows {
        writer.write_record(row.columns())?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

/// Which mapchart.net map a save file targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKind {
    Usa,
    Canada,
    UsaCanada,
}

impl MapKind {
    pub fn filename(self) -> &'static str {
        match self {
            MapKind::Usa => "mapchartSave-usa.txt",
            MapKind::Canada => "mapchartSave-canada.txt",
            MapKind::UsaCanada => "mapchartSave-usa_canada.txt",
        }
    }

    /// Page the save file is uploaded to.
    pub fn upload_url(self) -> &'static str {
        match self {
            MapKind::Usa => "https://www.mapchart.net/usa.html",
            MapKind::Canada => "https://www.mapchart.net/canada.html",
            MapKind::UsaCanada => "https://www.mapchart.net/usa-and-canada.html",
        }
    }
}

/// A colour group in the legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub label: &'static str,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Groups {
    #[serde(rename = "#e0f3db")]
    pub confirmed: Group,
    #[serde(rename = "#ffff33")]
    pub needed: Group,
}

/// Static map styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapStyle {
    pub hidden: Vec<String>,
    pub background: &'static str,
    pub borders: &'static str,
    pub legend_font: &'static str,
    pub legend_font_color: &'static str,
    pub legend_bg_color: &'static str,
    pub legend_width: u32,
    pub are_borders_shown: bool,
    pub default_color: &'static str,
    pub labels_color: &'static str,
    pub stroke_width: &'static str,
    pub are_labels_shown: bool,
    pub legend_position: &'static str,
    pub legend_size: &'static str,
    pub legend_status: &'static str,
    pub scaling_patterns: bool,
    pub legend_rows_same_color: bool,
    pub legend_column_count: u32,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            hidden: Vec::new(),
            background: "#fff",
            borders: "#000",
            legend_font: "Helvetica",
            legend_font_color: "#000",
            legend_bg_color: "#00000000",
            legend_width: 150,
            are_borders_shown: true,
            default_color: "#d1dbdd",
            labels_color: "#6a0707",
            stroke_width: "medium",
            are_labels_shown: true,
            legend_position: "bottom_left",
            legend_size: "medium",
            legend_status: "show",
            scaling_patterns: true,
            legend_rows_same_color: true,
            legend_column_count: 2,
        }
    }
}

/// A mapchart.net save file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapDescriptor {
    pub groups: Groups,
    pub title: String,
    #[serde(flatten)]
    pub style: MapStyle,
}

impl MapDescriptor {
    /// Build from already-labelled path lists.
    ///
    /// `title_prefix` is usually the selected callsigns; when blank the title
    /// is just `title_suffix`.
    pub fn new(
        title_prefix: &str,
        title_suffix: &str,
        confirmed: Vec<String>,
        needed: Vec<String>,
    ) -> Self {
        let title = format!("{} {}", title_prefix.trim(), title_suffix)
            .trim()
            .to_string();
        Self {
            groups: Groups {
                confirmed: Group {
                    label: CONFIRMED_LABEL,
                    paths: confirmed,
                },
                needed: Group {
                    label: NEEDED_LABEL,
                    paths: needed,
                },
            },
            title,
            style: MapStyle::default(),
        }
    }

    /// Build from one or more program results.
    ///
    /// Confirmed regions are listed alphabetically by code, needed regions in
    /// region-file order; parts are concatenated in the order given.
    pub fn from_results(
        title_prefix: &str,
        title_suffix: &str,
        parts: &[(&AggregationResult, &RegionSet)],
    ) -> Self {
        let mut confirmed = Vec::new();
        let mut needed = Vec::new();

        for (result, regions) in parts {
            let label = |code: &str| {
                regions
                    .get(code)
                    .map(|region| result.program.map_label(region))
                    .unwrap_or_else(|| code.to_string())
            };
            confirmed.extend(result.confirmed_sorted().iter().map(|c| label(c.as_str())));
            needed.extend(result.needed.iter().map(|c| label(c.as_str())));
        }

        Self::new(title_prefix, title_suffix, confirmed, needed)
    }

    pub fn confirmed(&self) -> &[String] {
        &self.groups.confirmed.paths
    }

    pub fn needed(&self) -> &[String] {
        &self.groups.needed.paths
    }
}

/// Write a map save file as a single JSON line.
pub fn write_map_descriptor(
    path: impl AsRef<Path>,
    descriptor: &MapDescriptor,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    let io_err = |source: std::io::Error| ExportError::Io {
        path: path.display().to_string(),
        source,
    };

    let mut writer = create(path)?;
    serde_json::to_writer(&mut writer, descriptor)?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}
