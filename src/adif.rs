//! Parser for ADIF (Amateur Data Interchange Format) contact logs.
//!
//! This module uses the `nom` parsing library to tokenize the tag stream of
//! an ADI file. Only the tag/value framing is interpreted here; field
//! semantics are left to [`ContactRecord`] accessors.
//!
//! # Format
//!
//! ```text
//! Optional header text <ADIF_VER:5>3.1.4 <EOH>
//! <CALL:4>W1AW <STATE:2>CT <QSO_DATE:8>20231123 <EOR>
//! ```
//!
//! Everything before `<EOH>` is the header; without `<EOH>` the whole input is
//! the body. Each field is `<NAME:LENGTH[:TYPE]>VALUE` where `LENGTH` counts
//! the characters of `VALUE`. Records end at `<EOR>`.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag_no_case, take, take_while1},
    character::complete::{char, digit1},
    combinator::{map, map_res, opt, value},
    sequence::{delimited, preceded},
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::contact::ContactRecord;

/// Errors that can occur while reading a log.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unterminated tag at offset {offset}: {tag:?}")]
    InvalidFormat { offset: usize, tag: String },

    #[error("Field {field} declares {declared} characters but only {available} remain")]
    InvalidLength {
        field: String,
        declared: usize,
        available: usize,
    },

    #[error("Failed to read log: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// A parsed log: header fields plus contact records in file order.
#[derive(Debug, Clone, Default)]
pub struct AdifLog {
    /// Header fields (before `<EOH>`), upper-cased keys.
    pub header: HashMap<String, String>,
    /// Contact records in the order they appear in the file.
    pub records: Vec<ContactRecord>,
}

/// A single tag in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag<'a> {
    Field { name: &'a str, len: usize },
    EndOfHeader,
    EndOfRecord,
}

fn is_field_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse the declared length of a field.
fn parse_length(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>()).parse(input)
}

/// Parse `NAME:LENGTH` with an optional `:TYPE` suffix.
fn parse_field_spec(input: &str) -> IResult<&str, Tag<'_>> {
    map(
        (
            take_while1(is_field_name_char),
            char(':'),
            parse_length,
            opt(preceded(char(':'), take_while1(|c: char| c.is_ascii_alphabetic()))),
        ),
        |(name, _, len, _)| Tag::Field { name, len },
    )
    .parse(input)
}

/// Parse one `<...>` tag.
fn parse_tag(input: &str) -> IResult<&str, Tag<'_>> {
    delimited(
        char('<'),
        alt((
            parse_field_spec,
            value(Tag::EndOfRecord, tag_no_case("EOR")),
            value(Tag::EndOfHeader, tag_no_case("EOH")),
            // Length-less fields carry no value
            map(take_while1(is_field_name_char), |name| Tag::Field {
                name,
                len: 0,
            }),
        )),
        char('>'),
    )
    .parse(input)
}

/// Parse the opening of a field tag, `<NAME:LENGTH`, without its closing `>`.
fn parse_tag_opening(input: &str) -> IResult<&str, (&str, usize)> {
    map(
        (char('<'), take_while1(is_field_name_char), char(':'), parse_length),
        |(_, name, _, len)| (name, len),
    )
    .parse(input)
}

/// Take exactly `len` characters of field data.
fn parse_value(input: &str, len: usize) -> IResult<&str, &str> {
    take(len).parse(input)
}

/// Split the input at the first `<EOH>` (any case).
///
/// Returns `(header, body)`; the header is empty when there is no `<EOH>`.
fn split_header(input: &str) -> (&str, &str) {
    const MARKER: &str = "<eoh>";
    // ASCII lowercasing keeps byte offsets valid for `input`
    match input.to_ascii_lowercase().find(MARKER) {
        Some(pos) => (&input[..pos], &input[pos + MARKER.len()..]),
        None => ("", input),
    }
}

/// What a section scan reports for each tag.
enum Item<'a> {
    Field { name: &'a str, value: &'a str },
    EndOfRecord,
}

/// Walk the tags of one section, reporting fields and `<EOR>` markers.
///
/// `base` is the byte offset of `section` within the whole document.
fn scan_section<'a>(
    section: &'a str,
    base: usize,
    mut on_item: impl FnMut(Item<'a>),
) -> ParseResult<()> {
    let mut rest = section;

    while let Some(pos) = rest.find('<') {
        rest = &rest[pos..];

        let (after, tag) = match parse_tag(rest) {
            Ok(parsed) => parsed,
            Err(_) => {
                if parse_tag_opening(rest).is_ok() {
                    let offset = base + section.len() - rest.len();
                    let tag = rest.lines().next().unwrap_or_default();
                    return Err(ParseError::InvalidFormat {
                        offset,
                        tag: tag.chars().take(32).collect(),
                    });
                }
                // Stray '<' in free text
                rest = &rest[1..];
                continue;
            }
        };
        rest = after;

        match tag {
            Tag::EndOfHeader => {}
            Tag::EndOfRecord => on_item(Item::EndOfRecord),
            Tag::Field { name, len } => {
                let (after, raw) =
                    parse_value(rest, len).map_err(|_| ParseError::InvalidLength {
                        field: name.to_ascii_uppercase(),
                        declared: len,
                        available: rest.chars().count(),
                    })?;
                rest = after;
                on_item(Item::Field {
                    name,
                    value: raw.trim(),
                });
            }
        }
    }

    Ok(())
}

/// Parse a complete ADI document.
///
/// # Example
///
/// ```
/// use waslist::adif::parse_adif;
///
/// let log = parse_adif("<CALL:4>W1AW<STATE:2>CT<EOR>").unwrap();
/// assert_eq!(log.records.len(), 1);
/// assert_eq!(log.records[0].region(), Some("CT"));
/// ```
pub fn parse_adif(input: &str) -> ParseResult<AdifLog> {
    let (header, body) = split_header(input);
    let body_offset = input.len() - body.len();

    let mut fields = HashMap::new();
    scan_section(header, 0, |item| {
        if let Item::Field { name, value } = item {
            fields.insert(name.to_ascii_uppercase(), value.to_string());
        }
    })?;

    let mut records = Vec::new();
    let mut current = ContactRecord::new();
    scan_section(body, body_offset, |item| match item {
        Item::Field { name, value } => current.insert(name, value),
        Item::EndOfRecord => {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
        }
    })?;

    if !current.is_empty() {
        debug!("Dropping trailing record without <EOR>: {}", current);
    }

    Ok(AdifLog {
        header: fields,
        records,
    })
}

/// Read and parse an ADI file from disk.
///
/// Invalid UTF-8 sequences are replaced rather than rejected, since many
/// loggers write Latin-1 names and QTH fields.
pub fn read_adif_file(path: impl AsRef<Path>) -> ParseResult<AdifLog> {
    let bytes = fs::read(path.as_ref())?;
    let content = String::from_utf8_lossy(&bytes);
    parse_adif(&content)
}
