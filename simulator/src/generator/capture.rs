//! Reader for logged transport captures.
//!
//! Each row is `Direction,Timestamp,"Hex Data",Parsed Info,Error`. Only
//! received frames long enough to carry a full scan become pings.

use anyhow::Context;
use log::warn;
use sonarcore::Ping;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Byte offset of the first scan sample inside a received frame.
const SCAN_OFFSET: usize = 92;
const SCAN_SAMPLES: usize = 90;

pub fn read_capture<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Ping>> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("opening capture {}", path_ref.display()))?;
    parse_capture(BufReader::new(file))
        .with_context(|| format!("reading capture {}", path_ref.display()))
}

pub fn parse_capture<R: BufRead>(reader: R) -> anyhow::Result<Vec<Ping>> {
    let mut pings = Vec::new();
    for (number, line) in reader.lines().enumerate().skip(1) {
        let line = line.with_context(|| format!("reading capture line {}", number + 1))?;
        match parse_row(&line) {
            Ok(Some(ping)) => pings.push(ping),
            Ok(None) => {}
            Err(err) => warn!("skipping capture line {}: {:#}", number + 1, err),
        }
    }
    Ok(pings)
}

/// Decodes one capture row; `Ok(None)` for rows that are not scan frames.
fn parse_row(line: &str) -> anyhow::Result<Option<Ping>> {
    let line = line.trim();
    let mut fields = line.splitn(3, ',');
    let (Some(direction), Some(timestamp), Some(rest)) = (fields.next(), fields.next(), fields.next())
    else {
        return Ok(None);
    };
    if direction != "RX" {
        return Ok(None);
    }

    let hex_start = rest.find('"').context("missing opening quote around hex data")? + 1;
    let hex_len = rest[hex_start..]
        .find('"')
        .context("missing closing quote around hex data")?;
    let hex = &rest[hex_start..hex_start + hex_len];
    let info = &rest[hex_start + hex_len + 1..];

    let bytes = hex
        .split_whitespace()
        .map(|byte| u8::from_str_radix(byte, 16).with_context(|| format!("bad hex byte {:?}", byte)))
        .collect::<anyhow::Result<Vec<u8>>>()?;
    if bytes.len() < SCAN_OFFSET + SCAN_SAMPLES {
        return Ok(None);
    }

    Ok(Some(Ping::new(
        timestamp.trim(),
        info_value(info, "temp").unwrap_or(0.0),
        info_value(info, "depth").unwrap_or(0.0),
        bytes[SCAN_OFFSET..SCAN_OFFSET + SCAN_SAMPLES].to_vec(),
    )))
}

/// Finds `key=value` in the free-form parsed-info column.
fn info_value(info: &str, key: &str) -> Option<f32> {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == ';' || c == '"')
        .filter_map(|token| token.split_once('='))
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .and_then(|(_, value)| value.trim_end_matches(|c: char| c.is_alphabetic()).parse().ok())
}
