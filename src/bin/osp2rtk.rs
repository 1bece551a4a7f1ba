//! Command line program generating an RTK style position log from an OSP
//! data file containing SiRF IV receiver messages.
//!
//! Exit status: 0 no errors, 1 argument error, 2 input open error, 3 output
//! create error or no solution data.

use std::fs::File;
use std::io::BufReader;
use std::process::exit;

use clap::error::ErrorKind;
use clap::Parser;
use env_logger::Target;
use log::{error, info};

use osp2rinex::basic::func::log_level_filter;
use osp2rinex::convbin::convert::generate_rtk;

#[derive(Parser, Debug)]
#[command(
    name = "osp2rtk",
    about = "Generates an RTK position file from an OSP data file containing SiRF IV receiver messages"
)]
struct Cli {
    /// Minimum satellites in a fix to acquire solutions
    #[arg(short = 'i', long = "minsv", value_name = "MINSV", default_value_t = 4)]
    minsv: u8,

    /// Maximum level to log (SEVERE, WARNING, INFO, CONFIG, FINE, FINER, FINEST)
    #[arg(short = 'l', long = "llevel", value_name = "LOGLEVEL", default_value = "INFO")]
    llevel: String,

    /// Output file (default: the input file name with .pos appended)
    #[arg(short = 'o', long = "output", value_name = "POSFILE")]
    output: Option<String>,

    /// Input OSP file
    #[arg(value_name = "OSPfilename", default_value = "DATA.OSP")]
    input: String,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit(0),
                _ => exit(1),
            }
        }
    };

    let level = match log_level_filter(&cli.llevel) {
        Some(level) => level,
        None => {
            eprintln!("Argument error: unknown log level {}", cli.llevel);
            exit(1);
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let input = match File::open(&cli.input) {
        Ok(file) => file,
        Err(e) => {
            error!("Cannot open file {}: {}", cli.input, e);
            exit(2);
        }
    };

    let out_file = cli.output.unwrap_or_else(|| format!("{}.pos", cli.input));
    let program = format!("osp2rtk v{}", env!("CARGO_PKG_VERSION"));
    match generate_rtk(
        BufReader::new(input),
        &program,
        &cli.input,
        &out_file,
        cli.minsv,
    ) {
        Ok(0) => {
            error!("No solution data in {}", cli.input);
            exit(3);
        }
        Ok(solutions) => {
            info!("{} solutions written to {}", solutions, out_file);
        }
        Err(e) => {
            error!("RTK file generation failed: {}", e);
            exit(3);
        }
    }
}
