//! Writing finished logs and raw histograms to disk

use anyhow::{bail, Result};
use chrono::Local;
use std::env;
use std::fs;
use std::io::Write;
use std::path;
use tmftools::Histogram;

/// Path of a new log file: the given one, or a timestamped name in the working directory
pub fn log_path(newpath: Option<path::PathBuf>) -> Result<path::PathBuf> {
    let mut path: path::PathBuf;
    match newpath {
        Some(p) => {
            path = p;
        }
        None => {
            path = env::current_dir()?;
            path.push(Local::now().format("tmf8828_%F-%H-%M-%S").to_string());
            path.set_extension("log");
        }
    }
    Ok(path)
}

/// Write a log to a file that must not exist yet
pub fn write_log(path: &path::Path, log: &str) -> Result<()> {
    if path.exists() {
        bail!("log file {} already exists", path.display());
    }
    let mut f = fs::File::create(path)?;
    f.write_all(log.as_bytes())?;
    Ok(())
}

/// Serialize raw histograms to tab-separated values (serial, bin, count)
pub fn raw_tsv(wtr: &mut csv::Writer<impl Write>, hists: &[Histogram]) -> Result<()> {
    for hist in hists {
        for (bin, count) in hist.bins.iter().enumerate() {
            wtr.write_record(&[hist.serial.to_string(), bin.to_string(), count.to_string()])?;
        }
    }
    wtr.flush()?;
    Ok(())
}
