//! Command line program capturing OSP message data from a serial attached
//! SiRF IV receiver into an OSP binary file.
//!
//! The receiver stream frames every message as `A0 A3 | length | payload |
//! checksum | B0 B3`; only the length and payload are stored, which is the
//! trimmed format the conversion tools read. On startup the receiver is set
//! up to emit the messages needed for RINEX generation at the requested
//! observation interval.
//!
//! Exit status: 0 no errors, 1 argument error, 2 port open error, 3 the
//! receiver is not sending OSP messages, 4 receiver setup error, 5 output
//! file create error, 6 write error.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::process::exit;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use env_logger::Target;
use log::{error, info, trace, warn};

use osp2rinex::basic::func::log_level_filter;
use osp2rinex::basic::time::capture_file_name;

// payloads above this size are not valid OSP traffic
const MAX_PAYLOAD: usize = 1023;

#[derive(Parser, Debug)]
#[command(
    name = "rx2osp",
    about = "Captures OSP message data from a SiRF IV receiver and stores them in an OSP binary file"
)]
struct Cli {
    /// Serial port baud rate
    #[arg(short = 'b', long = "baud", value_name = "BAUD", default_value_t = 57600)]
    baud: u32,

    /// Duration of the acquisition period, in minutes
    #[arg(short = 'd', long = "duration", value_name = "DURATION", default_value_t = 5)]
    duration: u32,

    /// Don't capture GPS ephemeris data (MID15)
    #[arg(short = 'e', long = "ephemeris")]
    ephemeris: bool,

    /// OSP binary output file (default yyyymmdd_HHMMSS.OSP)
    #[arg(short = 'f', long = "binfile", value_name = "BFILE")]
    binfile: Option<String>,

    /// Capture the GPS 50 bps nav message (MID8)
    #[arg(short = 'g', long = "GPS50bps")]
    gps50bps: bool,

    /// Observation interval (in seconds) for epoch data
    #[arg(short = 'i', long = "interval", value_name = "OBSINT", default_value_t = 5)]
    interval: u32,

    /// Maximum level to log (SEVERE, WARNING, INFO, CONFIG, FINE, FINER, FINEST)
    #[arg(short = 'l', long = "llevel", value_name = "LOGLEVEL", default_value = "INFO")]
    llevel: String,

    /// Serial port name where the receiver is connected
    #[arg(short = 'p', long = "port", value_name = "COMPORT", default_value = "/dev/ttyUSB0")]
    port: String,

    /// Stop epoch data acquisition when this MID (Message ID) arrives
    #[arg(short = 's', long = "stop", value_name = "MID", default_value_t = 7)]
    stop: u8,
}

enum ReadResult {
    Msg,
    ChecksumError,
    NoMessage,
    LengthError,
    FrameError,
}

fn payload_checksum(payload: &[u8]) -> u16 {
    payload
        .iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(b as u16) & 0x7FFF)
}

// read one framed OSP message, leaving its payload in the buffer
fn read_osp_msg<R: Read>(port: &mut R, payload: &mut Vec<u8>) -> ReadResult {
    let mut byte = [0u8; 1];
    // hunt for the A0 A3 start sequence
    loop {
        if port.read_exact(&mut byte).is_err() {
            return ReadResult::NoMessage;
        }
        if byte[0] != 0xA0 {
            continue;
        }
        if port.read_exact(&mut byte).is_err() {
            return ReadResult::NoMessage;
        }
        if byte[0] == 0xA3 {
            break;
        }
    }
    let mut word = [0u8; 2];
    if port.read_exact(&mut word).is_err() {
        return ReadResult::NoMessage;
    }
    let len = u16::from_be_bytes(word) as usize;
    if len == 0 || len >= MAX_PAYLOAD {
        return ReadResult::LengthError;
    }
    payload.resize(len, 0);
    if port.read_exact(payload).is_err() {
        return ReadResult::NoMessage;
    }
    if port.read_exact(&mut word).is_err() {
        return ReadResult::NoMessage;
    }
    if u16::from_be_bytes(word) != payload_checksum(payload) {
        return ReadResult::ChecksumError;
    }
    if port.read_exact(&mut word).is_err() {
        return ReadResult::NoMessage;
    }
    if word != [0xB0, 0xB3] {
        return ReadResult::FrameError;
    }
    ReadResult::Msg
}

// frame and send one command to the receiver; the payload is the MID byte
// followed by the hex encoded bytes given
fn write_osp_cmd<W: Write>(port: &mut W, mid: u8, payload_hex: &str) -> io::Result<()> {
    let mut payload = vec![mid];
    for token in payload_hex.split_whitespace() {
        let byte = u8::from_str_radix(token, 16)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "bad hex byte"))?;
        payload.push(byte);
    }
    let mut frame = vec![0xA0, 0xA3];
    frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    frame.extend_from_slice(&payload);
    frame.extend_from_slice(&payload_checksum(&payload).to_be_bytes());
    frame.extend_from_slice(&[0xB0, 0xB3]);
    port.write_all(&frame)
}

// state the data flow with the messages and rates needed for RINEX files
fn setup_receiver<W: Write>(port: &mut W, cli: &Cli) -> io::Result<()> {
    // enable all messages at the observation interval, then disable the
    // unwanted ones
    write_osp_cmd(port, 166, &format!("02 00 {:02X} 00 00 00 00", cli.interval))?;
    write_osp_cmd(port, 166, "04 00 00 00 00 00 00")?; // debug messages off
    write_osp_cmd(port, 166, "00 1D 00 00 00 00 00")?; // nav debug 29
    write_osp_cmd(port, 166, "00 1E 00 00 00 00 00")?; // nav debug 30
    write_osp_cmd(port, 166, "00 1F 00 00 00 00 00")?; // nav debug 31
    write_osp_cmd(port, 166, "00 04 00 00 00 00 00")?; // message 4 navigation
    if !cli.gps50bps {
        write_osp_cmd(port, 166, "00 08 00 00 00 00 00")?; // 50 bps data
    }
    write_osp_cmd(port, 166, "00 40 00 00 00 00 00")?; // aux measurements
    write_osp_cmd(port, 166, "00 32 00 00 00 00 00")?; // SBAS status
    write_osp_cmd(port, 166, "00 29 00 00 00 00 00")?; // geodetic nav
    // poll the data needed once per run
    write_osp_cmd(port, 132, "00")?; // software version -> MID6
    write_osp_cmd(port, 152, "00")?; // navigation parameters -> MID19
    if !cli.ephemeris {
        for _ in 0..3 {
            write_osp_cmd(port, 147, "00 00")?; // ephemeris -> MID15
        }
    }
    Ok(())
}

// capture messages until the message or epoch count is reached
fn acquire_bin<R: Read, W: Write>(
    port: &mut R,
    out: &mut W,
    max_msgs: u32,
    max_epochs: u32,
    stop_mid: u8,
) -> io::Result<u32> {
    let mut payload = Vec::new();
    let mut n_msgs = 0u32;
    let mut n_errors = 0u32;
    let mut n_epochs = 0u32;
    while n_msgs < max_msgs && n_epochs < max_epochs {
        let result = read_osp_msg(port, &mut payload);
        if let ReadResult::NoMessage = result {
            warn!("No message read or EOF");
            break;
        }
        let tag = format!("OSP<{}:{}>", payload.first().copied().unwrap_or(0), payload.len());
        match result {
            ReadResult::Msg => {
                n_msgs += 1;
                if payload.first() == Some(&stop_mid) {
                    n_epochs += 1;
                }
                out.write_all(&(payload.len() as u16).to_be_bytes())?;
                out.write_all(&payload)?;
                trace!("{} OK", tag);
            }
            ReadResult::ChecksumError => {
                warn!("{} Checksum error", tag);
                n_errors += 1;
            }
            ReadResult::LengthError => {
                warn!("{} Length out of margin", tag);
                n_errors += 1;
            }
            _ => {
                error!("{} Unexpected read result", tag);
                n_errors += 1;
            }
        }
    }
    info!(
        "Acq End; nMsgs:{} nEpochs:{} nErrors:{}",
        n_msgs, n_epochs, n_errors
    );
    Ok(n_msgs)
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

    if cli.interval == 0 {
        eprintln!("Argument error: observation interval cannot be zero");
        exit(1);
    }
    let n_epochs = cli.duration * 60 / cli.interval;

    let mut port = match serialport::new(&cli.port, cli.baud)
        .timeout(Duration::from_millis(2000))
        .open()
    {
        Ok(port) => port,
        Err(e) => {
            error!("Cannot open port {}: {}", cli.port, e);
            exit(2);
        }
    };

    // check the receiver mode before any setup
    let mut payload = Vec::new();
    match read_osp_msg(&mut port, &mut payload) {
        ReadResult::Msg => {}
        ReadResult::NoMessage => {
            error!("Error: the receiver is not sending OSP messages");
            exit(3);
        }
        _ => warn!("The receiver is sending erroneous OSP messages"),
    }

    if let Err(e) = setup_receiver(&mut port, &cli) {
        error!("Receiver setup failed: {}", e);
        exit(4);
    }

    let file_name = cli.binfile.clone().unwrap_or_else(capture_file_name);
    let out_file = match File::create(&file_name) {
        Ok(file) => file,
        Err(e) => {
            error!("Cannot create the binary output file {}: {}", file_name, e);
            exit(5);
        }
    };
    let mut writer = BufWriter::new(out_file);

    match acquire_bin(&mut port, &mut writer, n_epochs * 20, n_epochs, cli.stop) {
        Ok(n) => {
            if let Err(e) = writer.flush() {
                error!("Write error: {}", e);
                exit(6);
            }
            info!("{} messages stored in {}", n, file_name);
        }
        Err(e) => {
            error!("Write error: {}", e);
            exit(6);
        }
    }
}
