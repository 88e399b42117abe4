use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use gtfsraptor::gtfs::GtfsFileNames;
use gtfsraptor::pipeline::{self, ConvertConfig, OutputFormat, PeriodMode};
use tracing::error;

#[derive(Parser)]
#[command(name = "gtfsraptor", about = "GTFS -> compact binary network + RAPTOR queries")]
struct Cli {
    /// Increase log verbosity; repeat for more detail (-v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a GTFS feed directory into a compact network artifact set.
    Convert {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value = "binary")]
        format: CliFormat,
        #[arg(long, default_value_t = true)]
        compression: bool,
        #[arg(long, default_value_t = false)]
        debug_json: bool,
        #[arg(long, default_value_t = false)]
        gen_transfers: bool,
        #[arg(long, default_value_t = false)]
        allow_partial_trips: bool,
        #[arg(long, default_value_t = 1.33)]
        speed_walk: f64,
        #[arg(long, default_value_t = 500.0)]
        transfer_cutoff: f64,
        #[arg(long, default_value_t = false)]
        split_by_periods: bool,
        #[arg(long, value_enum, default_value = "auto")]
        mode: CliMode,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Check a previously converted artifact directory: file presence,
    /// magic/schema headers, and manifest checksums.
    Validate {
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliFormat {
    Binary,
    Json,
    Both,
}

impl From<CliFormat> for OutputFormat {
    fn from(value: CliFormat) -> Self {
        match value {
            CliFormat::Binary => OutputFormat::Binary,
            CliFormat::Json => OutputFormat::Json,
            CliFormat::Both => OutputFormat::Both,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliMode {
    Auto,
    Lyon,
}

impl From<CliMode> for PeriodMode {
    fn from(value: CliMode) -> Self {
        match value {
            CliMode::Auto => PeriodMode::Auto,
            CliMode::Lyon => PeriodMode::Lyon,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Convert {
            input,
            output,
            format,
            compression,
            debug_json,
            gen_transfers,
            allow_partial_trips,
            speed_walk,
            transfer_cutoff,
            split_by_periods,
            mode,
            jobs,
        } => {
            let config = ConvertConfig {
                input,
                output,
                format: format.into(),
                compression,
                debug_json,
                gen_transfers,
                allow_partial_trips,
                speed_walk_m_s: speed_walk,
                transfer_cutoff_m: transfer_cutoff,
                split_by_periods,
                mode: mode.into(),
                jobs,
                file_names: GtfsFileNames::default(),
            };
            match pipeline::convert(&config) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => report(e),
            }
        }
        Command::Validate { input } => match pipeline::check_artifacts(&input) {
            Ok(report) if report.valid => {
                println!("ok: artifacts at {} are valid", input.display());
                ExitCode::SUCCESS
            }
            Ok(report) => {
                for problem in &report.errors {
                    error!("{problem}");
                }
                ExitCode::from(1)
            }
            Err(e) => report(e),
        },
    }
}

fn report(e: pipeline::Error) -> ExitCode {
    error!("{e}");
    if e.is_usage_error() {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
