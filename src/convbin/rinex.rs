//! In-memory model of the RINEX file contents and the printers for the
//! observation and navigation formats, versions 2.10 and 3.00.
//!
//! The model is filled by the acquisition engine: header fields during the
//! first pass over the OSP file, observations and ephemerides during the
//! epoch pass. Observations are drained as each epoch is printed; only the
//! ephemerides are retained for the navigation file.

use std::io::{self, Write};

use crate::basic::time::{gps_seconds, gpst2time, local_timestamp, rinex_file_name, time2epoch};
use crate::basic::var::{GnssSystem, GpsSatNav, RnxVer, SatObsData, MAXOBSVAL, MINOBSVAL};
use crate::convbin::subframe::{fit_interval, scale_factor, ura_value};
use crate::convbin::ConvError;

pub struct RinexData {
    version: RnxVer,
    pgm: String,
    runby: String,
    marker_name: String,
    marker_number: String,
    observer: String,
    agency: String,
    rx_number: String,
    rx_type: String,
    rx_version: String,
    ant_number: String,
    ant_type: String,
    aprox_x: f64,
    aprox_y: f64,
    aprox_z: f64,
    ant_high: f64,
    ecc_east: f64,
    ecc_north: f64,
    wvlen_factor_l1: i32,
    wvlen_factor_l2: i32,
    first_obs_week: i32,
    first_obs_tow: f64,
    obs_interval: f64,
    // current epoch, from MID7
    gps_week: i32,
    gps_tow: f64,
    clk_bias: f64,
    // receiver time tag shared by the MID28 records of the epoch
    epoch_time_tag: f64,
    epoch_flag: u8,
    apply_bias: bool,
    append_eof: bool,
    systems: Vec<GnssSystem>,
    observations: Vec<SatObsData>,
    gps_ephm_nav: Vec<GpsSatNav>,
}

impl RinexData {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: RnxVer,
        pgm: &str,
        runby: &str,
        marker_name: &str,
        marker_number: &str,
        ant_number: &str,
        ant_type: &str,
        observer: &str,
        agency: &str,
        append_eof: bool,
        apply_bias: bool,
        systems: Vec<GnssSystem>,
    ) -> Result<Self, ConvError> {
        // version 2.10 has a single observable table shared by every system
        if version == RnxVer::V210
            && systems
                .windows(2)
                .any(|pair| pair[0].obs_types != pair[1].obs_types)
        {
            return Err(ConvError::ObsTypesMismatch);
        }
        Ok(RinexData {
            version,
            pgm: pgm.to_string(),
            runby: runby.to_string(),
            marker_name: marker_name.to_string(),
            marker_number: marker_number.to_string(),
            observer: observer.to_string(),
            agency: agency.to_string(),
            rx_number: "RXnumber?".to_string(),
            rx_type: "RXtype?".to_string(),
            rx_version: "RXversion?".to_string(),
            ant_number: ant_number.to_string(),
            ant_type: ant_type.to_string(),
            aprox_x: 0.0,
            aprox_y: 0.0,
            aprox_z: 0.0,
            ant_high: 0.0,
            ecc_east: 0.0,
            ecc_north: 0.0,
            wvlen_factor_l1: 1,
            wvlen_factor_l2: 0,
            first_obs_week: 0,
            first_obs_tow: 0.0,
            obs_interval: 0.0,
            gps_week: 0,
            gps_tow: 0.0,
            clk_bias: 0.0,
            epoch_time_tag: 0.0,
            epoch_flag: 0,
            apply_bias,
            append_eof,
            systems,
            observations: Vec::new(),
            gps_ephm_nav: Vec::new(),
        })
    }

    pub fn set_position(&mut self, x: f64, y: f64, z: f64) {
        self.aprox_x = x;
        self.aprox_y = y;
        self.aprox_z = z;
    }

    pub fn set_receiver(&mut self, number: String, rx_type: String, version: String, wlf1: i32, wlf2: i32) {
        self.rx_number = number;
        self.rx_type = rx_type;
        self.rx_version = version;
        self.wvlen_factor_l1 = wlf1;
        self.wvlen_factor_l2 = wlf2;
    }

    /// GPS time of the epoch as obtained from the receiver clock message.
    pub fn set_gps_time(&mut self, week: i32, tow: f64, bias: f64) {
        self.gps_week = week;
        self.gps_tow = tow;
        self.clk_bias = bias;
    }

    pub fn gps_time(&self) -> f64 {
        self.gps_tow
    }

    pub fn set_first_obs_time(&mut self) {
        self.first_obs_week = self.gps_week;
        self.first_obs_tow = self.gps_tow;
    }

    /// Observation interval as the time difference to the stored epoch,
    /// accounting for week rollover.
    pub fn set_interval_time(&mut self, week: i32, tow: f64) {
        self.obs_interval =
            (tow - self.gps_tow) + (week - self.gps_week) as f64 * crate::basic::var::SECONDS_WEEK;
    }

    /// Store one measurement, tagged with the receiver time it was taken at.
    /// Returns whether the time tag belongs to the current epoch; data of a
    /// different epoch are not stored. Observable types outside the system
    /// tables are silently dropped.
    pub fn add_measurement(
        &mut self,
        sys: char,
        sat: u8,
        obs_type: &str,
        value: f64,
        lol: u8,
        strength: u8,
        ttag: f64,
    ) -> bool {
        if self.observations.is_empty() {
            self.epoch_time_tag = ttag;
        }
        if self.epoch_time_tag != ttag {
            return false;
        }
        for (i, system) in self.systems.iter().enumerate() {
            if system.system != sys {
                continue;
            }
            if let Some(j) = system.obs_types.iter().position(|t| t == obs_type) {
                self.observations.push(SatObsData {
                    sys_index: i,
                    satellite: sat,
                    epoch_time: ttag,
                    obs_type_index: j,
                    obs_value: value,
                    loss_of_lock: lol,
                    strength,
                });
            }
            break;
        }
        true
    }

    /// Store an ephemeris unless the same (satellite, week, T0c) is already
    /// present.
    pub fn add_gps_nav(&mut self, sat: u8, bo: [[u32; 4]; 8]) -> bool {
        let duplicate = self.gps_ephm_nav.iter().any(|nav| {
            nav.satellite == sat
                && nav.broadcast_orbit[5][2] == bo[5][2]
                && nav.broadcast_orbit[0][0] == bo[0][0]
        });
        if duplicate {
            return false;
        }
        self.gps_ephm_nav.push(GpsSatNav {
            satellite: sat,
            broadcast_orbit: bo,
        });
        true
    }

    pub fn nav_data_count(&self) -> usize {
        self.gps_ephm_nav.len()
    }

    /// Drop the observations accumulated for the current epoch.
    pub fn clear_obs(&mut self) {
        self.observations.clear();
    }

    pub fn obs_file_name(&self, prefix: &str) -> String {
        rinex_file_name(prefix, self.gps_week, self.gps_tow, 'O')
    }

    /// Navigation file name from the oldest ephemeris epoch, or the current
    /// GPS time when no navigation data were collected.
    pub fn nav_file_name(&mut self, prefix: &str) -> String {
        if self.gps_ephm_nav.is_empty() {
            return rinex_file_name(prefix, self.gps_week, self.gps_tow, 'N');
        }
        self.sort_nav();
        let first = &self.gps_ephm_nav[0];
        let week = first.broadcast_orbit[5][2] as i32;
        let tow = first.broadcast_orbit[0][0] as f64 * scale_factor(0, 0);
        rinex_file_name(prefix, week, tow, 'N')
    }

    fn sort_nav(&mut self) {
        self.gps_ephm_nav.sort_by_key(|nav| {
            (
                nav.broadcast_orbit[5][2],
                nav.broadcast_orbit[0][0],
                nav.satellite,
            )
        });
    }

    /// epoch time corrected by the receiver clock bias when requested
    fn corrected_time_tag(&self) -> f64 {
        self.epoch_time_tag - if self.apply_bias { self.clk_bias } else { 0.0 }
    }

    pub fn write_obs_header<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let version = match self.version {
            RnxVer::V210 => 2.10,
            RnxVer::V300 => 3.00,
        };
        writeln!(
            w,
            "{:9.2}{:11}{:<20}{:<20}{:<20}",
            version, "", "OBSERVATION DATA", "M", "RINEX VERSION / TYPE"
        )?;
        writeln!(
            w,
            "{:<20.20}{:<20.20}{:<20.20}{:<20}",
            self.pgm,
            self.runby,
            local_timestamp(),
            "PGM / RUN BY / DATE"
        )?;
        writeln!(w, "{:<60.60}{:<20}", self.marker_name, "MARKER NAME")?;
        writeln!(w, "{:<60.60}{:<20}", self.marker_number, "MARKER NUMBER")?;
        if self.version == RnxVer::V300 {
            writeln!(w, "{:<60.60}{:<20}", "NON GEODETIC", "MARKER TYPE")?;
        }
        writeln!(
            w,
            "{:<20.20}{:<40.40}{:<20}",
            self.observer, self.agency, "OBSERVER / AGENCY"
        )?;
        writeln!(
            w,
            "{:<20.20}{:<20.20}{:<20.20}{:<20}",
            self.rx_number, self.rx_type, self.rx_version, "REC # / TYPE / VERS"
        )?;
        writeln!(
            w,
            "{:<20.20}{:<20.20}{:20}{:<20}",
            self.ant_number, self.ant_type, "", "ANT # / TYPE"
        )?;
        writeln!(
            w,
            "{:14.4}{:14.4}{:14.4}{:18}{:<20}",
            self.aprox_x, self.aprox_y, self.aprox_z, "", "APPROX POSITION XYZ"
        )?;
        writeln!(
            w,
            "{:14.4}{:14.4}{:14.4}{:18}{:<20}",
            self.ant_high, self.ecc_east, self.ecc_north, "", "ANTENNA: DELTA H/E/N"
        )?;
        match self.version {
            RnxVer::V210 => {
                writeln!(
                    w,
                    "{:6}{:6}{:6}{:42}{:<20}",
                    self.wvlen_factor_l1, self.wvlen_factor_l2, 0, "", "WAVELENGTH FACT L1/2"
                )?;
                // single observable table, two character codes, at most nine
                write!(w, "{:6}", self.systems[0].obs_types.len())?;
                for j in 0..9 {
                    match self.systems[0].obs_types.get(j) {
                        Some(t) => write!(w, "{:4}{:<2.2}", "", t)?,
                        None => write!(w, "{:6}", "")?,
                    }
                }
                writeln!(w, "{:<20}", "# / TYPES OF OBSERV")?;
            }
            RnxVer::V300 => {
                for system in &self.systems {
                    write!(w, "{}  {:3}", system.system, system.obs_types.len())?;
                    for j in 0..13 {
                        match system.obs_types.get(j) {
                            Some(t) => write!(w, " {:<3.3}", t)?,
                            None => write!(w, "{:4}", "")?,
                        }
                    }
                    writeln!(w, "  {:<20}", "SYS / # / OBS TYPES")?;
                }
            }
        }
        writeln!(w, "{:10.3}{:50}{:<20}", self.obs_interval, "", "INTERVAL")?;
        let mut ep = [0.0; 6];
        time2epoch(gpst2time(self.first_obs_week, self.first_obs_tow), &mut ep);
        writeln!(
            w,
            "  {:04}    {:02}    {:02}    {:02}    {:02}  {:11.7}{:5}{:<3}{:9}{:<20}",
            ep[0] as i32,
            ep[1] as u8,
            ep[2] as u8,
            ep[3] as u8,
            ep[4] as u8,
            ep[5],
            "",
            "GPS",
            "",
            "TIME OF FIRST OBS"
        )?;
        writeln!(w, "{:60}{:<20}", "", "END OF HEADER")?;
        Ok(())
    }

    /// Print the accumulated epoch and drain its observations. An epoch whose
    /// observations were discarded prints nothing.
    pub fn write_obs_epoch<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        if self.observations.is_empty() {
            return Ok(());
        }
        self.observations
            .sort_by_key(|o| (o.sys_index, o.satellite, o.obs_type_index));
        if self.apply_bias {
            for obs in self.observations.iter_mut() {
                obs.obs_value -=
                    self.clk_bias * self.systems[obs.sys_index].bias_factor[obs.obs_type_index];
            }
        }

        // distinct (system, satellite) pairs, in sorted order
        let mut sat_ids = Vec::new();
        let mut last = None;
        for obs in &self.observations {
            if last != Some((obs.sys_index, obs.satellite)) {
                sat_ids.push(format!(
                    "{}{:02}",
                    self.systems[obs.sys_index].system, obs.satellite
                ));
                last = Some((obs.sys_index, obs.satellite));
            }
        }

        let ttag = self.corrected_time_tag();
        let mut ep = [0.0; 6];
        time2epoch(gpst2time(self.gps_week, ttag), &mut ep);
        match self.version {
            RnxVer::V210 => {
                write!(
                    w,
                    " {:02} {:02} {:02} {:02} {:02}{:11.7}  {}{:3}",
                    (ep[0] as i32) % 100,
                    ep[1] as u8,
                    ep[2] as u8,
                    ep[3] as u8,
                    ep[4] as u8,
                    ep[5],
                    self.epoch_flag,
                    sat_ids.len()
                )?;
                for id in sat_ids.iter().take(12) {
                    write!(w, "{}", id)?;
                }
                for _ in sat_ids.len()..12 {
                    write!(w, "{:3}", "")?;
                }
                writeln!(w, "{:12.9}", self.clk_bias)?;
                for chunk in sat_ids[12.min(sat_ids.len())..].chunks(12) {
                    write!(w, "{:32}", "")?;
                    for id in chunk {
                        write!(w, "{}", id)?;
                    }
                    writeln!(w)?;
                }
            }
            RnxVer::V300 => {
                writeln!(
                    w,
                    "> {:04} {:02} {:02} {:02} {:02}{:11.7}  {}{:3}{:5}{:15.12}{:3}",
                    ep[0] as i32,
                    ep[1] as u8,
                    ep[2] as u8,
                    ep[3] as u8,
                    ep[4] as u8,
                    ep[5],
                    self.epoch_flag,
                    sat_ids.len(),
                    "",
                    self.clk_bias,
                    ""
                )?;
            }
        }
        self.write_sat_obs_values(w)?;
        Ok(())
    }

    // one line of observable values per satellite, in observable table order;
    // gaps before a present type print as a zero field, trailing gaps are cut
    fn write_sat_obs_values<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        let observations = std::mem::take(&mut self.observations);
        let mut idx = 0;
        while idx < observations.len() {
            let sys_index = observations[idx].sys_index;
            let satellite = observations[idx].satellite;
            if self.version == RnxVer::V300 {
                write!(w, "{}{:02}", self.systems[sys_index].system, satellite)?;
            }
            let mut slot = 0;
            while idx < observations.len()
                && observations[idx].sys_index == sys_index
                && observations[idx].satellite == satellite
            {
                if self.version == RnxVer::V210 && slot > 0 && slot % 5 == 0 {
                    writeln!(w)?;
                }
                if observations[idx].obs_type_index == slot {
                    let obs = &observations[idx];
                    let mut value = obs.obs_value;
                    if !(MINOBSVAL..=MAXOBSVAL).contains(&value) {
                        value = 0.0;
                    }
                    write!(w, "{:14.3}", value)?;
                    if obs.loss_of_lock == 0 {
                        write!(w, " ")?;
                    } else {
                        write!(w, "{}", obs.loss_of_lock)?;
                    }
                    if obs.strength == 0 {
                        write!(w, " ")?;
                    } else {
                        write!(w, "{}", obs.strength)?;
                    }
                    idx += 1;
                } else {
                    write!(w, "{:14.3}  ", 0.0)?;
                }
                slot += 1;
            }
            writeln!(w)?;
        }
        Ok(())
    }

    /// End of file event record: flag 4, one comment line.
    pub fn write_obs_eof<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if !self.append_eof {
            return Ok(());
        }
        let mut ep = [0.0; 6];
        time2epoch(gpst2time(self.gps_week, self.corrected_time_tag()), &mut ep);
        writeln!(
            w,
            " {:02} {:02} {:02} {:02} {:02}{:11.7}  {}{:3}",
            (ep[0] as i32) % 100,
            ep[1] as u8,
            ep[2] as u8,
            ep[3] as u8,
            ep[4] as u8,
            ep[5],
            4,
            1
        )?;
        writeln!(w, "{:<60}{:<20}", "END OF FILE", "COMMENT")?;
        Ok(())
    }

    /// Navigation file leader. The version field is always 2.10; the
    /// ionosphere and UTC almanac blocks are deliberately not emitted.
    pub fn write_nav_header<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(
            w,
            "{:9.2}{:11}{:<20}{:20}{:<20}",
            2.10, "", "N GPS NAV DATA", "", "RINEX VERSION / TYPE"
        )?;
        writeln!(
            w,
            "{:<20.20}{:<20.20}{:<20.20}{:<20}",
            self.pgm,
            self.runby,
            local_timestamp(),
            "PGM / RUN BY / DATE"
        )?;
        writeln!(w, "{:60}{:<20}", "", "END OF HEADER")?;
        Ok(())
    }

    /// One 8-line record per stored ephemeris, sorted by week, T0c and
    /// satellite. Values are the raw bit patterns scaled here.
    pub fn write_nav_epochs<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        self.sort_nav();
        for nav in &self.gps_ephm_nav {
            let bo = &nav.broadcast_orbit;
            let week = bo[5][2] as i32;
            let t0c = bo[0][0] as f64 * scale_factor(0, 0);
            let mut ep = [0.0; 6];
            time2epoch(gpst2time(week, t0c), &mut ep);
            write!(
                w,
                "{:02} {:02} {:02} {:02} {:02} {:02} {:4.1}",
                nav.satellite,
                (ep[0] as i32) % 100,
                ep[1] as u8,
                ep[2] as u8,
                ep[3] as u8,
                ep[4] as u8,
                gps_seconds(t0c)
            )?;
            for k in 1..4 {
                write_nav_field(w, bo[0][k] as i32 as f64 * scale_factor(0, k))?;
            }
            writeln!(w)?;
            for j in 1..8 {
                write!(w, "   ")?;
                for k in 0..4 {
                    if j == 7 && k == 2 {
                        break; // no spares on the last line
                    }
                    let value = if j == 7 && k == 1 {
                        fit_interval(bo[7][1], bo[6][3])
                    } else if j == 6 && k == 0 {
                        ura_value(bo[6][0] as usize)
                    } else if j == 2 && (k == 1 || k == 3) {
                        // e and sqrt(A) are 32 bits unsigned
                        bo[j][k] as f64 * scale_factor(j, k)
                    } else {
                        bo[j][k] as i32 as f64 * scale_factor(j, k)
                    };
                    write_nav_field(w, value)?;
                }
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Navigation data field: %19.12E with the exponent forced to two digits.
fn write_nav_field<W: Write>(w: &mut W, value: f64) -> io::Result<()> {
    let formatted = format!("{:.12e}", value);
    let (mantissa, exponent) = match formatted.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (formatted.as_str(), 0),
    };
    write!(
        w,
        "{:>19}",
        format!(
            "{}E{}{:02}",
            mantissa,
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::var::{CLIGHT, FREQ1};

    fn gps_sbas_systems() -> Vec<GnssSystem> {
        let codes = |s: &str| s.split(',').map(|t| t.to_string()).collect::<Vec<_>>();
        vec![
            GnssSystem::new('G', codes("C1C,L1C,D1C,S1C")),
            GnssSystem::new('S', codes("C1C,L1C,D1C,S1C")),
        ]
    }

    fn model(version: RnxVer, apply_bias: bool) -> RinexData {
        RinexData::new(
            version,
            "osp2rinex",
            "RUNBY",
            "MRKNAM",
            "MRKNUM",
            "Antenna#",
            "AntennaType",
            "OBSERVER",
            "AGENCY",
            true,
            apply_bias,
            gps_sbas_systems(),
        )
        .expect("valid systems")
    }

    fn render<F: FnOnce(&mut Vec<u8>)>(f: F) -> String {
        let mut out = Vec::new();
        f(&mut out);
        String::from_utf8(out).expect("ascii output")
    }

    #[test]
    fn v210_rejects_diverging_observables() {
        let systems = vec![
            GnssSystem::new('G', vec!["C1C".to_string(), "L1C".to_string()]),
            GnssSystem::new('S', vec!["C1C".to_string()]),
        ];
        let result = RinexData::new(
            RnxVer::V210,
            "p",
            "r",
            "m",
            "n",
            "a",
            "t",
            "o",
            "y",
            true,
            true,
            systems.clone(),
        );
        assert!(matches!(result, Err(ConvError::ObsTypesMismatch)));
        assert!(RinexData::new(
            RnxVer::V300,
            "p",
            "r",
            "m",
            "n",
            "a",
            "t",
            "o",
            "y",
            true,
            true,
            systems
        )
        .is_ok());
    }

    #[test]
    fn measurements_of_a_later_time_tag_are_refused() {
        let mut rinex = model(RnxVer::V210, false);
        assert!(rinex.add_measurement('G', 1, "C1C", 2.0e7, 0, 5, 100.0));
        assert!(rinex.add_measurement('G', 2, "C1C", 2.1e7, 0, 5, 100.0));
        assert!(!rinex.add_measurement('G', 3, "C1C", 2.2e7, 0, 5, 101.0));
        assert_eq!(rinex.observations.len(), 2);
    }

    #[test]
    fn unknown_observable_is_dropped_but_epoch_continues() {
        let mut rinex = model(RnxVer::V210, false);
        assert!(rinex.add_measurement('G', 1, "C1C", 2.0e7, 0, 5, 100.0));
        assert!(rinex.add_measurement('G', 1, "C5Q", 2.0e7, 0, 5, 100.0));
        assert_eq!(rinex.observations.len(), 1);
    }

    #[test]
    fn nav_dedup_by_sat_week_t0c() {
        let mut rinex = model(RnxVer::V210, false);
        let mut bo = [[0u32; 4]; 8];
        bo[5][2] = 2021;
        bo[0][0] = 100;
        assert!(rinex.add_gps_nav(9, bo));
        assert!(!rinex.add_gps_nav(9, bo));
        bo[0][0] = 101;
        assert!(rinex.add_gps_nav(9, bo));
        assert_eq!(rinex.nav_data_count(), 2);
    }

    #[test]
    fn observations_sorted_by_system_satellite_type() {
        let mut rinex = model(RnxVer::V300, false);
        rinex.set_gps_time(2047, 345600.0, 0.0);
        rinex.add_measurement('S', 22, "C1C", 1.0, 0, 5, 100.0);
        rinex.add_measurement('G', 7, "S1C", 40.0, 0, 0, 100.0);
        rinex.add_measurement('G', 7, "C1C", 2.0e7, 0, 5, 100.0);
        rinex.add_measurement('G', 3, "C1C", 2.0e7, 0, 5, 100.0);
        rinex
            .observations
            .sort_by_key(|o| (o.sys_index, o.satellite, o.obs_type_index));
        let keys: Vec<_> = rinex
            .observations
            .iter()
            .map(|o| (o.sys_index, o.satellite, o.obs_type_index))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys[0], (0, 3, 0));
        assert_eq!(keys.last(), Some(&(1, 22, 0)));
    }

    #[test]
    fn v210_epoch_applies_bias_to_code_and_phase() {
        let mut rinex = model(RnxVer::V210, true);
        rinex.set_gps_time(2047, 345600.0, 1.0e-7);
        rinex.add_measurement('G', 1, "C1C", 20000000.0, 0, 5, 345600.0);
        rinex.add_measurement('G', 1, "L1C", 100000.0, 0, 5, 345600.0);
        let out = render(|w| rinex.write_obs_epoch(w).expect("epoch"));
        let expected_code = 20000000.0 - 1.0e-7 * CLIGHT;
        let expected_phase = 100000.0 - 1.0e-7 * FREQ1;
        assert!(out.contains(&format!("{:14.3}", expected_code)), "{}", out);
        assert!(out.contains(&format!("{:14.3}", expected_phase)), "{}", out);
        // observations are drained on emit
        assert!(rinex.observations.is_empty());
    }

    #[test]
    fn no_bias_applied_when_disabled() {
        let mut rinex = model(RnxVer::V210, false);
        rinex.set_gps_time(2047, 345600.0, 1.0e-7);
        rinex.add_measurement('G', 1, "C1C", 20000000.0, 0, 5, 345600.0);
        let out = render(|w| rinex.write_obs_epoch(w).expect("epoch"));
        assert!(out.contains(&format!("{:14.3}", 20000000.0)), "{}", out);
    }

    #[test]
    fn v210_epoch_header_layout() {
        let mut rinex = model(RnxVer::V210, false);
        // week 2000, tow 0 is 2018-05-06 00:00:00
        rinex.set_gps_time(2000, 0.0, 0.0);
        rinex.add_measurement('G', 1, "C1C", 2.0e7, 0, 5, 0.0);
        rinex.add_measurement('G', 12, "C1C", 2.1e7, 0, 6, 0.0);
        let out = render(|w| rinex.write_obs_epoch(w).expect("epoch"));
        let first = out.lines().next().expect("one line");
        assert!(
            first.starts_with(" 18 05 06 00 00  0.0000000  0  2G01G12"),
            "{}",
            first
        );
        assert!(first.ends_with(" 0.000000000"), "{}", first);
    }

    #[test]
    fn v210_epoch_header_wraps_beyond_twelve_satellites() {
        let mut rinex = model(RnxVer::V210, false);
        rinex.set_gps_time(2000, 0.0, 0.0);
        for sat in 1..=14u8 {
            rinex.add_measurement('G', sat, "C1C", 2.0e7 + sat as f64, 0, 5, 0.0);
        }
        let out = render(|w| rinex.write_obs_epoch(w).expect("epoch"));
        let lines: Vec<&str> = out.lines().collect();
        // first line: twelve ids, no padding, then the receiver clock bias
        assert!(lines[0].contains(" 0 14G01"), "{}", lines[0]);
        assert!(lines[0].contains("G12"), "{}", lines[0]);
        assert!(!lines[0].contains("G13"), "{}", lines[0]);
        assert!(lines[0].ends_with(" 0.000000000"), "{}", lines[0]);
        // the remaining ids continue on a line indented to column 33
        assert_eq!(lines[1], format!("{:32}G13G14", ""));
        // one value line per satellite follows
        assert_eq!(lines.len(), 2 + 14);
    }

    #[test]
    fn v300_epoch_header_and_sat_lines() {
        let mut rinex = model(RnxVer::V300, false);
        rinex.set_gps_time(2000, 0.0, 2.5e-7);
        rinex.add_measurement('G', 1, "S1C", 42.0, 0, 0, 0.5);
        rinex.add_measurement('G', 1, "C1C", 2.0e7, 0, 7, 0.5);
        let out = render(|w| rinex.write_obs_epoch(w).expect("epoch"));
        let mut lines = out.lines();
        let header = lines.next().expect("header");
        assert!(
            header.starts_with("> 2018 05 06 00 00  0.5000000  0  1"),
            "{}",
            header
        );
        assert!(header.contains(" 0.000000250000"), "{}", header);
        let sat = lines.next().expect("satellite line");
        assert!(sat.starts_with("G01"), "{}", sat);
        // C1C value, then a gap for L1C and D1C, then S1C
        assert!(sat.contains("  20000000.000 7"), "{}", sat);
        assert!(sat.ends_with("        42.000  "), "{}", sat);
    }

    #[test]
    fn out_of_range_value_prints_as_zero() {
        let mut rinex = model(RnxVer::V300, false);
        rinex.set_gps_time(2000, 0.0, 0.0);
        rinex.add_measurement('G', 1, "C1C", 1.0e10, 0, 5, 0.5);
        let out = render(|w| rinex.write_obs_epoch(w).expect("epoch"));
        assert!(out.contains("         0.000"), "{}", out);
    }

    #[test]
    fn v210_header_carries_two_character_codes() {
        let rinex = model(RnxVer::V210, false);
        let out = render(|w| rinex.write_obs_header(w).expect("header"));
        assert!(out.contains("     2.10"), "{}", out);
        assert!(
            out.contains("     4    C1    L1    D1    S1"),
            "{}",
            out
        );
        assert!(out.contains("WAVELENGTH FACT L1/2"), "{}", out);
        assert!(out.contains("END OF HEADER"), "{}", out);
    }

    #[test]
    fn v300_header_lists_observables_per_system() {
        let rinex = model(RnxVer::V300, false);
        let out = render(|w| rinex.write_obs_header(w).expect("header"));
        assert!(out.contains("     3.00"), "{}", out);
        assert!(out.contains("G    4 C1C L1C D1C S1C"), "{}", out);
        assert!(out.contains("S    4 C1C L1C D1C S1C"), "{}", out);
        assert!(!out.contains("WAVELENGTH"), "{}", out);
        assert!(out.contains("NON GEODETIC"), "{}", out);
    }

    #[test]
    fn eof_comment_block() {
        let mut rinex = model(RnxVer::V210, false);
        rinex.set_gps_time(2000, 0.0, 0.0);
        let out = render(|w| rinex.write_obs_eof(w).expect("eof"));
        assert!(out.contains("  4  1"), "{}", out);
        assert!(out.contains("END OF FILE"), "{}", out);
        let none = render(|w| {
            let mut quiet = model(RnxVer::V210, false);
            quiet.append_eof = false;
            quiet.write_obs_eof(w).expect("eof")
        });
        assert!(none.is_empty());
    }

    #[test]
    fn nav_field_uses_two_digit_exponent() {
        let cases = [
            (0.0, " 0.000000000000E+00"),
            (1.0, " 1.000000000000E+00"),
            (-2.5e-9, "-2.500000000000E-09"),
            (604800.0, " 6.048000000000E+05"),
        ];
        for (value, expected) in cases {
            let out = render(|w| write_nav_field(w, value).expect("field"));
            assert_eq!(out, expected);
            assert_eq!(out.len(), 19);
        }
    }

    #[test]
    fn nav_record_has_eight_lines() {
        let mut rinex = model(RnxVer::V210, false);
        let mut bo = [[0u32; 4]; 8];
        bo[5][2] = 2000;
        bo[0][0] = 0; // T0c 0 => 2018-05-06 00:00:00
        bo[6][0] = 1; // URA index -> 2.8 m
        bo[6][3] = 250; // IODC
        bo[7][1] = 1; // fit flag -> 14 h with this IODC
        bo[7][0] = 34560000;
        rinex.add_gps_nav(9, bo);
        let out = render(|w| rinex.write_nav_epochs(w).expect("nav"));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].starts_with("09 18 05 06 00 00  0.0"), "{}", lines[0]);
        assert!(lines[6].contains("2.800000000000E+00"), "{}", lines[6]);
        // transmission time and fit interval on the last line
        assert!(lines[7].contains("3.456000000000E+05"), "{}", lines[7]);
        assert!(lines[7].contains("1.400000000000E+01"), "{}", lines[7]);
        assert_eq!(lines[7].len(), 3 + 19 * 2);
    }

    #[test]
    fn nav_records_sorted_by_week_t0c_satellite() {
        let mut rinex = model(RnxVer::V210, false);
        let mut bo = [[0u32; 4]; 8];
        bo[5][2] = 2001;
        bo[0][0] = 50;
        rinex.add_gps_nav(5, bo);
        bo[5][2] = 2000;
        bo[0][0] = 80;
        rinex.add_gps_nav(9, bo);
        bo[0][0] = 10;
        rinex.add_gps_nav(3, bo);
        let out = render(|w| rinex.write_nav_epochs(w).expect("nav"));
        let sats: Vec<&str> = out
            .lines()
            .step_by(8)
            .map(|l| l.split_whitespace().next().expect("sat"))
            .collect();
        assert_eq!(sats, vec!["03", "09", "05"]);
    }

    #[test]
    fn file_names_derive_from_first_epoch() {
        let mut rinex = model(RnxVer::V210, false);
        rinex.set_gps_time(2000, 0.0, 0.0);
        assert_eq!(rinex.obs_file_name("PNT1"), "PNT1126a00.18O");
        assert_eq!(rinex.nav_file_name("PNT1"), "PNT1126a00.18N");
        let mut bo = [[0u32; 4]; 8];
        bo[5][2] = 2000;
        bo[0][0] = (7200 / 16) as u32; // T0c 02:00:00
        rinex.add_gps_nav(1, bo);
        assert_eq!(rinex.nav_file_name("PNT1"), "PNT1126c00.18N");
    }
}
