//! fluent-trace - FlueNT10G trace file converter
//!
//! Converts capture-format hardware traces to nanosecond pcap files (`export`),
//! nanosecond pcap files to replay-format hardware traces (`import`), and writes
//! constant-bit-rate test traffic (`generate`).

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use fluent_trace::generate::{generate_cbr, CbrConfig};
use fluent_trace::info::{TraceFormat, TraceInfo};
use fluent_trace::{export_file, import_file, DEFAULT_BUFFER_SIZE};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "fluent-trace")]
#[command(about = "Convert between FlueNT10G hardware traces and nanosecond pcap files")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Capacity of the streaming read buffer, in bytes
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE, global = true)]
    buffer_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a capture-format trace to a nanosecond pcap file
    Export {
        /// Trace file written by the capture hardware
        input: PathBuf,

        /// Output pcap file
        output: PathBuf,

        /// Maximum number of bytes captured per packet
        max_caplen: u16,
    },

    /// Convert a nanosecond pcap file to a replay-format trace
    Import {
        /// Input pcap file (nanosecond precision)
        input: PathBuf,

        /// Output trace file for the replay hardware
        output: PathBuf,
    },

    /// Write a constant-bit-rate nanosecond pcap file
    Generate {
        /// Output pcap file
        output: PathBuf,

        /// Frame length in bytes, without preamble and FCS
        #[arg(long, default_value_t = 60)]
        packet_len: usize,

        /// Raw data rate in bits per second
        #[arg(long, default_value_t = 10e9)]
        rate: f64,

        /// Trace duration in seconds
        #[arg(long, default_value_t = 100e-3)]
        duration: f64,
    },

    /// Print a summary of a hardware trace file
    Info {
        /// Trace file
        file: PathBuf,

        /// Layout of the trace file
        #[arg(long, value_enum)]
        format: Format,

        /// Maximum capture length the capture hardware was configured with
        #[arg(long, required_if_eq("format", "capture"))]
        max_caplen: Option<u16>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Capture,
    Replay,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export {
            input,
            output,
            max_caplen,
        } => {
            info!(input = %input.display(), output = %output.display(), max_caplen, "export");
            let summary = export_file(&input, &output, max_caplen, cli.buffer_size)
                .with_context(|| format!("exporting {}", input.display()))?;
            println!("Successfully wrote {} packets to pcap file", summary.packets);
        }
        Commands::Import { input, output } => {
            info!(input = %input.display(), output = %output.display(), "import");
            let summary = import_file(&input, &output, cli.buffer_size)
                .with_context(|| format!("importing {}", input.display()))?;
            println!("Successfully wrote {} packets to trace file", summary.packets);
        }
        Commands::Generate {
            output,
            packet_len,
            rate,
            duration,
        } => {
            let config = CbrConfig {
                packet_len,
                data_rate: rate,
                duration,
            };
            info!(output = %output.display(), ?config, "generate");
            let file = File::create(&output)
                .with_context(|| format!("creating {}", output.display()))?;
            let summary = generate_cbr(&config, BufWriter::new(file))?;
            println!("Successfully wrote {} packets to pcap file", summary.packets);
        }
        Commands::Info {
            file,
            format,
            max_caplen,
        } => {
            let format = match format {
                Format::Capture => TraceFormat::Capture {
                    // enforced by clap
                    max_caplen: max_caplen.unwrap_or(u16::MAX),
                },
                Format::Replay => TraceFormat::Replay,
            };
            let info = TraceInfo::from_file(&file, format)
                .with_context(|| format!("reading {}", file.display()))?;
            println!("{}", info);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
