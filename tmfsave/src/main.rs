use anyhow::{Context, Result};
use std::fs::File;
use std::io::{stdout, BufReader, Write};
use std::path::PathBuf;
use tmfsave::client::ClientHandle;
use tmfsave::{save, CliArgs};
use tmftools::cfg::{self, SessionConfig};
use tmftools::reduce::{self, Crosstalk};
use tmftools::seq;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command line arguments
    let args: CliArgs = argh::from_env();

    if args.version {
        println!(
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            env!("CARGO_PKG_VERSION"),
        );
        return Ok(())
    }

    // Diagnostics go to stderr, the log to stdout or a file
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Load the session config
    let config = match &args.config {
        Some(c) => {
            let f = File::open(c).with_context(|| format!("could not open config {}", c))?;
            cfg::load(BufReader::new(f))?
        },
        None => SessionConfig::default(),
    };

    let mut client = ClientHandle::new(args.addr.clone())?;

    let outcome = seq::decode_sequence(&mut client, config.clone())?;
    let log = match &outcome {
        Ok(report) => report.log.clone(),
        Err(e) => e.log_line(),
    };

    // Save or print the log
    if args.save || args.output.is_some() {
        let path = save::log_path(args.output.as_ref().map(PathBuf::from))?;
        save::write_log(&path, &log)?;
        info!(path = %path.display(), "log saved");
    } else {
        let stdout = stdout();
        let mut stdout = stdout.lock();
        stdout.write_all(log.as_bytes())?;
        stdout.flush()?;
    }

    if let (Some(raw), Ok(report)) = (&args.raw, &outcome) {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .from_path(raw)?;
        save::raw_tsv(&mut wtr, &report.raw)?;
        info!(path = %raw, histograms = report.raw.len(), "raw histograms saved");
    }

    if args.crosstalk {
        match seq::decode_sequence_with(&mut client, config, Crosstalk::default())? {
            Ok(report) => {
                let pixel_crosstalks = reduce::filter_non_pixel(&report.reduced);
                println!("Pixel crosstalks {:?}", pixel_crosstalks);
                match pixel_crosstalks.iter().min() {
                    Some(min) => println!("minimum crosstalk {}", min),
                    None => println!("minimum crosstalk n/a"),
                }
            },
            Err(e) => print!("{}", e.log_line()),
        }
    }
    Ok(())
}
