use argh::FromArgs;

#[derive(Debug, FromArgs, Clone)]
/// Record one complete 8x8 histogram sequence from a TMF882x sensor
/// and write it as a text log
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// sensor publisher address
    #[argh(option, default = "String::from(\"tcp://169.254.0.2:8083\")")]
    pub addr: String,
    /// session config file path (JSON)
    #[argh(option)]
    pub config: Option<String>,
    /// log file path (default: standard output)
    #[argh(option, short = 'o')]
    pub output: Option<String>,
    /// save the log to a timestamped file in the working directory
    #[argh(switch, short = 's')]
    pub save: bool,
    /// tab-separated file for the raw histograms listed in the config
    #[argh(option)]
    pub raw: Option<String>,
    /// run a second sequence and report the crosstalk of every pixel
    #[argh(switch, short = 'x')]
    pub crosstalk: bool,
}

pub mod client;
pub mod save;
