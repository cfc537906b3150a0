use argh::FromArgs;
use anyhow::{bail, Result};
use either::{Left, Right};
use std::fs::{self, File};
use std::io::{stdin, stdout, BufReader, Write};

use tmftools::de::{self, Record};

#[derive(Debug, FromArgs, Clone)]
/// Read saved histogram logs and print every histogram bin as
/// tab-separated (label, bin, count) rows on standard output, one row
/// per bin, ready for plotting. Histograms without a pixel label are
/// printed with the label '-'.
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// include object distances as (column, target, distance, confidence) rows
    #[argh(switch, short = 'o')]
    pub objects: bool,
    /// with no input or when input is '-', read from standard input
    #[argh(positional)]
    pub input: Vec<String>,
}

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();
    if args.version {
        let stdout = stdout();
        let mut stdout = stdout.lock();
        writeln!(
            stdout,
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            env!("CARGO_PKG_VERSION"),
        )?;
        return Ok(())
    }

    // Collect inputs
    let mut inputs = Vec::new();
    if args.input.is_empty() {
        inputs.push(Left(()));
    } else {
        let mut contains_stdin = false;
        for i in args.input {
            if i == "-" {
                if contains_stdin {
                    bail!("cannot specify '-' for stdin twice");
                } else {
                    contains_stdin = true;
                    inputs.push(Left(()));
                }
            } else {
                match fs::metadata(&i) {
                    Ok(m) => {
                        if m.is_file() {
                            inputs.push(Right(i));
                        } else {
                            bail!("{} is not a file", &i);
                        }
                    },
                    Err(e) => bail!(e),
                }
            }
        }
    }

    let stdout = stdout();
    let stdout = stdout.lock();
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b'\t')
        .from_writer(stdout);

    for i in inputs {
        let records = match i {
            Left(()) => {
                let stdin = stdin();
                let stdin = stdin.lock();
                de::log(BufReader::new(stdin))?
            },
            Right(path) => {
                let f = File::open(path)?;
                de::log(BufReader::new(f))?
            },
        };
        for record in records {
            match record {
                Record::Hist { label, bins } => {
                    let label = if label.is_empty() { String::from("-") } else { label };
                    for (bin, count) in bins.iter().enumerate() {
                        wtr.write_record(&[label.clone(), bin.to_string(), count.to_string()])?;
                    }
                },
                Record::Obj(pairs) if args.objects => {
                    for (slot, (distance, confidence)) in pairs.iter().enumerate() {
                        wtr.write_record(&[
                            (slot / 2 + 1).to_string(),
                            (slot % 2).to_string(),
                            distance.to_string(),
                            confidence.to_string(),
                        ])?;
                    }
                },
                Record::Error(e) => bail!("log records an error: {}", e),
                _ => {},
            }
        }
    }
    wtr.flush()?;
    Ok(())
}
