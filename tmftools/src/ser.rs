//! Serialization of histograms and objects to the `;`-delimited text log
//!
//! Each record is one line:
//!
//! ```text
//! #HISTINFO;Transaction ID: 8;Capture: 0;Type: 0;num_tdc: 5;num_bins: 256;sub_capture: 0
//! #HIST57;0;0;3;17;...                  (128 bins; tag suffix is the pixel label)
//! #OBJ;12345678;0;8;8;1500;200;0;0;...  (distance;confidence for 72 columns x 2 targets)
//! #ERROR;CODE: 7
//! ```

use anyhow::Result;
use std::io::Write;

use crate::msg::HistogramMsg;
use crate::obj::ObjectTable;
use crate::CAPTURES_PER_SEQUENCE;

/// Fixed prefix of the `#OBJ` record: tag, device serial, and 8x8 geometry
pub const OBJ_PREFIX: [&str; 5] = ["#OBJ", "12345678", "0", "8", "8"];

/// Writer for log records: `;`-delimited, unquoted, `\n`-terminated, variable width
pub fn writer<W: Write>(wtr: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b';')
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(wtr)
}

/// Record describing a received histogram message
pub fn histinfo(wtr: &mut csv::Writer<impl Write>, hist: &HistogramMsg) -> Result<()> {
    wtr.write_record(&[
        "#HISTINFO".to_string(),
        format!("Transaction ID: {}", hist.capture_num),
        format!("Capture: {}", hist.capture_num.rem_euclid(CAPTURES_PER_SEQUENCE)),
        format!("Type: {}", hist.histogram_type),
        format!("num_tdc: {}", hist.num_tdc),
        format!("num_bins: {}", hist.num_bins),
        format!("sub_capture: {}", hist.sub_capture),
    ])?;
    Ok(())
}

/// Record of one logical histogram's bins
pub fn hist(wtr: &mut csv::Writer<impl Write>, label: &str, bins: &[i32]) -> Result<()> {
    wtr.write_field(format!("#HIST{}", label))?;
    for bin in bins {
        wtr.write_field(bin.to_string())?;
    }
    wtr.write_record(None::<&[u8]>)?;
    Ok(())
}

/// Record of the distance and confidence of every object slot
pub fn obj(wtr: &mut csv::Writer<impl Write>, table: &ObjectTable) -> Result<()> {
    for field in OBJ_PREFIX.iter() {
        wtr.write_field(field)?;
    }
    for entry in table.entries() {
        wtr.write_field(entry.distance_mm.to_string())?;
        wtr.write_field(entry.confidence.to_string())?;
    }
    wtr.write_record(None::<&[u8]>)?;
    Ok(())
}
