//! Deserialization of saved text logs back into records

use anyhow::{bail, Context, Result};
use std::io::Read;

/// Fields of a `#HISTINFO` record
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct HistInfo {
    pub transaction: i32,
    pub capture: i32,
    pub histogram_type: i32,
    pub num_tdc: i32,
    pub num_bins: i32,
    pub sub_capture: i32,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Record {
    HistInfo(HistInfo),
    /// `label` is the tag suffix: a pixel, a serial number, or empty
    Hist { label: String, bins: Vec<i32> },
    /// (distance, confidence) for each object slot
    Obj(Vec<(i32, i32)>),
    Error(String),
}

/// Deserialize all records of a log
pub fn log(rdr: impl Read) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b';')
        .quoting(false)
        .from_reader(rdr);
    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let tag = &record[0];
        if tag == "#HISTINFO" {
            records.push(Record::HistInfo(HistInfo {
                transaction: value(record.get(1))?,
                capture: value(record.get(2))?,
                histogram_type: value(record.get(3))?,
                num_tdc: value(record.get(4))?,
                num_bins: value(record.get(5))?,
                sub_capture: value(record.get(6))?,
            }));
        } else if let Some(label) = tag.strip_prefix("#HIST") {
            let bins = record
                .iter()
                .skip(1)
                .map(|b| b.parse::<i32>())
                .collect::<Result<Vec<_>, _>>()?;
            records.push(Record::Hist { label: label.to_string(), bins });
        } else if tag == "#OBJ" {
            let vals = record
                .iter()
                .skip(5)
                .map(|v| v.parse::<i32>())
                .collect::<Result<Vec<_>, _>>()?;
            records.push(Record::Obj(
                vals.chunks_exact(2).map(|p| (p[0], p[1])).collect(),
            ));
        } else if tag == "#ERROR" {
            records.push(Record::Error(record.iter().skip(1).collect::<Vec<_>>().join(";")));
        } else {
            bail!("unrecognized log record {}", tag);
        }
    }
    Ok(records)
}

/// Value of a `Name: value` field
fn value(field: Option<&str>) -> Result<i32> {
    let field = field.context("missing #HISTINFO field")?;
    let (_, v) = field
        .split_once(": ")
        .with_context(|| format!("malformed #HISTINFO field {}", field))?;
    Ok(v.parse()?)
}
