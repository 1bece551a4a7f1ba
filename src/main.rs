//! Command line program generating RINEX files from an OSP data file
//! containing SiRF IV receiver messages.
//!
//! Exit status: 0 no errors, 1 argument error, 2 input open error, 3 output
//! create error or no epoch data.

use std::fs::File;
use std::io::BufReader;
use std::process::exit;

use clap::error::ErrorKind;
use clap::Parser;
use env_logger::Target;
use log::{error, info};

use osp2rinex::basic::func::{get_tokens, log_level_filter};
use osp2rinex::basic::var::RnxVer;
use osp2rinex::convbin::convert::{generate_rinex, ConvOptions};
use osp2rinex::convbin::ConvError;

#[derive(Parser, Debug)]
#[command(
    name = "osp2rinex",
    about = "Generates RINEX files from an OSP data file containing SiRF IV receiver messages"
)]
struct Cli {
    /// Don't append end-of-file comment lines to the RINEX file
    #[arg(short = 'a', long = "aend")]
    aend: bool,

    /// Don't apply receiver clock bias to measurements and time
    #[arg(short = 'b', long = "bias")]
    bias: bool,

    /// GPS code measurements to include (comma separated)
    #[arg(short = 'c', long = "gpsc", value_name = "GPS", default_value = "C1C,L1C,D1C,S1C")]
    gpsc: String,

    /// Don't use MID15 (rx ephemeris) to generate the GPS nav file
    #[arg(short = 'e', long = "ephemeris")]
    ephemeris: bool,

    /// Use MID8 (50 bps data) to generate the GPS nav file
    #[arg(short = 'g', long = "GPS50bps")]
    gps50bps: bool,

    /// Minimum satellites in a fix to acquire observations
    #[arg(short = 'i', long = "minsv", value_name = "MINSV", default_value_t = 4)]
    minsv: u8,

    /// Receiver antenna number
    #[arg(short = 'j', long = "antnum", value_name = "ANTN", default_value = "Antenna#")]
    antnum: String,

    /// Receiver antenna type
    #[arg(short = 'k', long = "antype", value_name = "ANTT", default_value = "AntennaType")]
    antype: String,

    /// Maximum level to log (SEVERE, WARNING, INFO, CONFIG, FINE, FINER, FINEST)
    #[arg(short = 'l', long = "llevel", value_name = "LOGLEVEL", default_value = "INFO")]
    llevel: String,

    /// Marker name
    #[arg(short = 'm', long = "mrkname", value_name = "MRKNAM", default_value = "MRKNAM")]
    mrkname: String,

    /// Generate the RINEX GPS navigation file
    #[arg(short = 'n', long = "nRINEX")]
    nrinex: bool,

    /// Observer name
    #[arg(short = 'o', long = "observer", value_name = "OBSERVER", default_value = "OBSERVER")]
    observer: String,

    /// Who runs the RINEX file generation
    #[arg(short = 'p', long = "runby", value_name = "RUNBY", default_value = "RUNBY")]
    runby: String,

    /// RINEX file name prefix (4-character station designator)
    #[arg(short = 'r', long = "rinex", value_name = "RINEX", default_value = "PNT1")]
    rinex: String,

    /// SBAS measurements to include (comma separated)
    #[arg(short = 's', long = "sbas", value_name = "SBAS", default_value = "C1C,L1C,D1C,S1C")]
    sbas: String,

    /// MID (Message ID) of the last OSP message in an epoch
    #[arg(short = 't', long = "last", value_name = "MID", default_value_t = 7)]
    last: u8,

    /// Marker number
    #[arg(short = 'u', long = "mrknum", value_name = "MRKNUM", default_value = "MRKNUM")]
    mrknum: String,

    /// RINEX version to generate (V210, V300)
    #[arg(short = 'v', long = "ver", value_name = "VER", default_value = "V210")]
    ver: String,

    /// Agency name
    #[arg(short = 'y', long = "agency", value_name = "AGENCY", default_value = "AGENCY")]
    agency: String,

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

    let version: RnxVer = match cli.ver.parse() {
        Ok(version) => version,
        Err(e) => {
            eprintln!("Argument error: {}", e);
            exit(1);
        }
    };

    let opts = ConvOptions {
        version,
        pgm: format!("osp2rinex v{}", env!("CARGO_PKG_VERSION")),
        runby: cli.runby,
        marker_name: cli.mrkname,
        marker_number: cli.mrknum,
        ant_number: cli.antnum,
        ant_type: cli.antype,
        observer: cli.observer,
        agency: cli.agency,
        gps_codes: get_tokens(&cli.gpsc, ','),
        sbas_codes: get_tokens(&cli.sbas, ','),
        prefix: cli.rinex,
        min_svs: cli.minsv,
        append_eof: !cli.aend,
        apply_bias: !cli.bias,
        use_mid15: !cli.ephemeris,
        use_mid8: cli.gps50bps,
        navi: cli.nrinex,
    };

    let input = match File::open(&cli.input) {
        Ok(file) => file,
        Err(e) => {
            error!("Cannot open file {}: {}", cli.input, e);
            exit(2);
        }
    };

    match generate_rinex(BufReader::new(input), &opts) {
        Ok(0) => {
            error!("No epoch data in {}", cli.input);
            exit(3);
        }
        Ok(epochs) => {
            info!("End of RINEX generation. Epochs read: {}", epochs);
        }
        Err(e @ ConvError::ObsTypesMismatch) => {
            eprintln!("Argument error: {}", e);
            exit(1);
        }
        Err(e) => {
            error!("RINEX generation failed: {}", e);
            exit(3);
        }
    }
}
