//! Drivers running the acquisition passes and printing the output files.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use crate::basic::var::{GnssSystem, RnxVer};
use crate::convbin::acq::GnssDataAcq;
use crate::convbin::rinex::RinexData;
use crate::convbin::rtk::RtkObservation;
use crate::convbin::ConvError;

/// The receiver family producing the OSP stream.
pub const RECEIVER: &str = "SiRFIV";

pub struct ConvOptions {
    pub version: RnxVer,
    pub pgm: String,
    pub runby: String,
    pub marker_name: String,
    pub marker_number: String,
    pub ant_number: String,
    pub ant_type: String,
    pub observer: String,
    pub agency: String,
    pub gps_codes: Vec<String>,
    pub sbas_codes: Vec<String>,
    pub prefix: String,
    pub min_svs: u8,
    pub append_eof: bool,
    pub apply_bias: bool,
    pub use_mid15: bool,
    pub use_mid8: bool,
    pub navi: bool,
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style.tick_strings(&["-", "\\", "|", "/"]));
    }
    pb
}

/// Generate the RINEX observation file, and the navigation file when
/// requested, from an already open OSP input. Returns the number of epochs
/// acquired; output files are created in the working directory with their
/// standard names.
pub fn generate_rinex<R: Read + Seek>(reader: R, opts: &ConvOptions) -> Result<usize, ConvError> {
    let systems = vec![
        GnssSystem::new('G', opts.gps_codes.clone()),
        GnssSystem::new('S', opts.sbas_codes.clone()),
    ];
    let mut rinex = RinexData::new(
        opts.version,
        &opts.pgm,
        &opts.runby,
        &opts.marker_name,
        &opts.marker_number,
        &opts.ant_number,
        &opts.ant_type,
        &opts.observer,
        &opts.agency,
        opts.append_eof,
        opts.apply_bias,
        systems,
    )?;
    let mut acq = GnssDataAcq::new(RECEIVER, opts.min_svs, reader);

    // header data are sparse in the file, collect them first
    if !acq.acq_header_data(&mut rinex)? {
        warn!("All, or some header data not acquired");
    }

    let obs_name = rinex.obs_file_name(&opts.prefix);
    let mut writer = BufWriter::new(File::create(&obs_name)?);
    rinex.write_obs_header(&mut writer)?;

    acq.rewind()?;
    let pb = spinner();
    let mut epochs = 0usize;
    while acq.acq_epoch_data(&mut rinex, opts.use_mid15, opts.use_mid8)? {
        rinex.write_obs_epoch(&mut writer)?;
        epochs += 1;
        pb.set_message(format!("Decoding epochs: {}", epochs));
        pb.tick();
    }
    rinex.write_obs_eof(&mut writer)?;
    writer.flush()?;
    pb.finish_with_message(format!("{} epochs written to {}", epochs, obs_name));

    if opts.navi {
        let nav_name = rinex.nav_file_name(&opts.prefix);
        let mut nav_writer = BufWriter::new(File::create(&nav_name)?);
        rinex.write_nav_header(&mut nav_writer)?;
        rinex.write_nav_epochs(&mut nav_writer)?;
        nav_writer.flush()?;
        info!(
            "{} navigation records written to {}",
            rinex.nav_data_count(),
            nav_name
        );
    }
    Ok(epochs)
}

/// Generate the RTK position log from an already open OSP input. Returns the
/// number of solutions written.
pub fn generate_rtk<R: Read + Seek>(
    reader: R,
    program: &str,
    inp_file: &str,
    out_file: &str,
    min_svs: u8,
) -> Result<usize, ConvError> {
    let mut rtko = RtkObservation::new(program, inp_file);
    let mut acq = GnssDataAcq::new(RECEIVER, min_svs, reader);

    if !acq.acq_rtk_header(&mut rtko)? {
        warn!("All, or some header data not acquired");
    }

    acq.rewind()?;
    let mut writer = BufWriter::new(File::create(out_file)?);
    rtko.write_header(&mut writer)?;
    let mut solutions = 0usize;
    while acq.acq_rtk_epoch(&mut rtko)? {
        rtko.write_solution(&mut writer)?;
        solutions += 1;
    }
    writer.flush()?;
    Ok(solutions)
}
