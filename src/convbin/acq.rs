//! Acquisition of RINEX and RTK data from a binary OSP file.
//!
//! The engine reads messages through the framer and routes each one to its
//! handler by message identifier. Two passes are run over the file: a header
//! pass collecting the sparse header items, and an epoch pass assembling the
//! per-satellite measurements into epochs. Messages of unexpected length or
//! content are logged and skipped; only I/O failures end the acquisition.

use std::io::{Read, Seek, SeekFrom};

use log::{debug, info, trace, warn};

use crate::basic::var::{GPS_WEEK_ROLLOVER, L1WLINV, MAXCHANNELS};
use crate::convbin::message::OspMessage;
use crate::convbin::rinex::RinexData;
use crate::convbin::rtk::RtkObservation;
use crate::convbin::subframe::{check_parity, extract_ephemeris, strip_parity, SubframeStore};
use crate::convbin::ConvError;

struct Mid2Solution {
    x: f64,
    y: f64,
    z: f64,
    week: i32,
    tow: f64,
    sats: u8,
}

pub struct GnssDataAcq<R> {
    receiver: String,
    min_svs_fix: u8,
    reader: R,
    message: OspMessage,
    subframes: SubframeStore,
}

impl<R: Read + Seek> GnssDataAcq<R> {
    pub fn new(receiver: &str, min_svs_fix: u8, reader: R) -> Self {
        GnssDataAcq {
            receiver: receiver.to_string(),
            min_svs_fix,
            reader,
            message: OspMessage::new(),
            subframes: SubframeStore::new(),
        }
    }

    /// Rewind the input for the next pass.
    pub fn rewind(&mut self) -> Result<(), ConvError> {
        self.reader.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    // read the next message, reporting a mid-payload end of stream once
    fn next_message(&mut self) -> bool {
        match self.message.fill(&mut self.reader) {
            Ok(filled) => filled,
            Err(e) => {
                warn!("acquisition ended: {}", e);
                false
            }
        }
    }

    /// Header pass: iterate until the approximate position (first usable
    /// MID2), receiver identification (first MID6), first epoch time (first
    /// usable MID7) and observation interval (two consecutive usable MID7)
    /// have all been captured, or the file ends.
    pub fn acq_header_data(&mut self, rinex: &mut RinexData) -> Result<bool, ConvError> {
        let mut rx_id_set = false;
        let mut apx_set = false;
        let mut first_eph_set = false;
        let mut intrv_begin = false;
        let mut intrv_set = false;
        while !(apx_set && rx_id_set && first_eph_set && intrv_set) && self.next_message() {
            let mid = match self.message.get() {
                Ok(mid) => mid,
                Err(_) => continue,
            };
            match mid {
                2 => {
                    if !apx_set {
                        apx_set = self.get_mid2_rinex_data(rinex).unwrap_or(false);
                    }
                }
                6 => {
                    if !rx_id_set {
                        rx_id_set = self.get_mid6_rx_data(rinex).unwrap_or(false);
                    }
                }
                7 => {
                    if !first_eph_set {
                        first_eph_set = self.get_mid7_time_data(rinex).unwrap_or(false);
                        intrv_begin = first_eph_set;
                        if first_eph_set {
                            rinex.set_first_obs_time();
                        }
                    } else if !intrv_begin {
                        intrv_begin = self.get_mid7_time_data(rinex).unwrap_or(false);
                    } else if !intrv_set {
                        intrv_set = self.get_mid7_interval(rinex).unwrap_or(false);
                        intrv_begin = intrv_set;
                    }
                }
                _ => {}
            }
        }
        debug!(
            "RINEX header data available: AproxPosition {}; First epoch time {}; Observation interval {}; Receiver version {}",
            if apx_set { "YES" } else { "NO" },
            if first_eph_set { "YES" } else { "NO" },
            if intrv_set { "YES" } else { "NO" },
            if rx_id_set { "YES" } else { "NO" },
        );
        Ok(apx_set && first_eph_set && rx_id_set && intrv_set)
    }

    /// Epoch pass: accumulate MID28 measurements sharing one receiver time
    /// tag; the MID7 clock message closes the epoch. A MID28 with a different
    /// time tag before any MID7 discards the accumulated observations and is
    /// pushed back for the next epoch. Ephemeris data (MID8, MID15) may
    /// appear anywhere in the sequence.
    ///
    /// Returns true when an epoch was acquired, false at end of file.
    pub fn acq_epoch_data(
        &mut self,
        rinex: &mut RinexData,
        use_mid15: bool,
        use_mid8: bool,
    ) -> Result<bool, ConvError> {
        let mut data_available = false;
        let mut msg_pos = self.reader.stream_position()?;
        while self.next_message() {
            let mid = match self.message.get() {
                Ok(mid) => mid,
                Err(_) => continue,
            };
            match mid {
                7 => {
                    // sent when the position for the current epoch is computed
                    if self.get_mid7_time_data(rinex).unwrap_or(false) && data_available {
                        return Ok(true);
                    }
                }
                8 => {
                    if use_mid8 {
                        let _ = self.get_mid8_nav_data(rinex);
                    }
                }
                15 => {
                    if use_mid15 {
                        let _ = self.get_mid15_nav_data(rinex);
                    }
                }
                28 => {
                    let mut same_epoch = false;
                    if self
                        .get_mid28_obs_data(rinex, &mut same_epoch)
                        .unwrap_or(false)
                    {
                        if same_epoch {
                            data_available = true;
                        } else {
                            // no MID7 arrived, so the bias to apply is unknown;
                            // push the message back and report the epoch empty
                            self.reader.seek(SeekFrom::Start(msg_pos))?;
                            rinex.clear_obs();
                            info!(
                                "A MID28 sequence without MID7 in epoch {}",
                                rinex.gps_time()
                            );
                            return Ok(data_available);
                        }
                    }
                }
                _ => {}
            }
            msg_pos = self.reader.stream_position()?;
        }
        Ok(data_available)
    }

    /// RTK header pass: scan the whole file for the first and last usable
    /// solution times and the receiver masks.
    pub fn acq_rtk_header(&mut self, rtko: &mut RtkObservation) -> Result<bool, ConvError> {
        let mut mask_set = false;
        let mut fet_set = false;
        while self.next_message() {
            let mid = match self.message.get() {
                Ok(mid) => mid,
                Err(_) => continue,
            };
            match mid {
                2 => {
                    if self.get_mid2_rtk_data(rtko).unwrap_or(false) {
                        if !fet_set {
                            rtko.set_start_time();
                            fet_set = true;
                        }
                        rtko.set_end_time();
                    }
                }
                19 => {
                    mask_set = self.get_mid19_masks(rtko).unwrap_or(false);
                }
                _ => {}
            }
        }
        debug!(
            "RTKO header data available: Fist epoch time {}; Mask data {}",
            if fet_set { "YES" } else { "NO" },
            if mask_set { "YES" } else { "NO" },
        );
        Ok(mask_set && fet_set)
    }

    /// RTK epoch pass: the next usable MID2 carries the epoch solution.
    pub fn acq_rtk_epoch(&mut self, rtko: &mut RtkObservation) -> Result<bool, ConvError> {
        while self.next_message() {
            let mid = match self.message.get() {
                Ok(mid) => mid,
                Err(_) => continue,
            };
            if mid == 2 && self.get_mid2_rtk_data(rtko).unwrap_or(false) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // MID2: position solution, fixed payload of 41 bytes
    fn read_mid2(&mut self) -> Result<Option<Mid2Solution>, ConvError> {
        if self.message.payload_len() != 41 {
            info!("MID2 msg len <> 41");
            return Ok(None);
        }
        let x = self.message.get_i32()? as f64;
        let y = self.message.get_i32()? as f64;
        let z = self.message.get_i32()? as f64;
        self.message.skip(9)?; // velocities, mode1, HDOP, mode2
        let week = self.message.get_u16()? as i32 + GPS_WEEK_ROLLOVER;
        let tow = self.message.get_u32()? as f64 / 100.0;
        let sats = self.message.get()?;
        if sats < self.min_svs_fix {
            trace!("MID2 wrong fix: SVs less than minimum");
            return Ok(None);
        }
        Ok(Some(Mid2Solution {
            x,
            y,
            z,
            week,
            tow,
            sats,
        }))
    }

    fn get_mid2_rinex_data(&mut self, rinex: &mut RinexData) -> Result<bool, ConvError> {
        match self.read_mid2()? {
            Some(sol) => {
                rinex.set_position(sol.x, sol.y, sol.z);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get_mid2_rtk_data(&mut self, rtko: &mut RtkObservation) -> Result<bool, ConvError> {
        match self.read_mid2()? {
            Some(sol) => {
                // no quality indicator exists in OSP messages, 5 is assumed
                rtko.set_position(sol.week, sol.tow, sol.x, sol.y, sol.z, 5, sol.sats);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // MID6: software version; the layout is two length bytes followed by the
    // version and customer strings
    fn get_mid6_rx_data(&mut self, rinex: &mut RinexData) -> Result<bool, ConvError> {
        let version_len = self.message.get()? as usize;
        let customer_len = self.message.get()? as usize;
        if self.message.payload_len() != 1 + 2 + version_len + customer_len {
            info!("In MID6, message/receiver/customer length don't match");
            return Ok(false);
        }
        let mut sw_version = String::with_capacity(version_len);
        for _ in 0..version_len {
            sw_version.push(self.message.get()? as char);
        }
        self.message.skip(customer_len)?;
        // the receiver number is the version substring from the producer
        // family signature, or empty when it is absent
        let rx_number = sw_version
            .find("GSD4")
            .map(|at| sw_version[at..].to_string())
            .unwrap_or_default();
        rinex.set_receiver(rx_number, self.receiver.clone(), sw_version, 1, 0);
        Ok(true)
    }

    // MID7: clock status, fixed payload of 20 bytes
    fn get_mid7_time_data(&mut self, rinex: &mut RinexData) -> Result<bool, ConvError> {
        if self.message.payload_len() != 20 {
            info!("MID7 msg len <> 20");
            return Ok(false);
        }
        let week = self.message.get_u16()? as i32; // already unrolled
        let tow = self.message.get_u32()? as f64 / 100.0;
        let sats = self.message.get()?;
        if sats < self.min_svs_fix {
            trace!("MID7 ignored: solution only {} sats", sats);
            return Ok(false);
        }
        let _drift = self.message.get_u32()?; // clock drift (Hz), not used
        let bias = self.message.get_u32()? as f64 * 1.0e-9;
        rinex.set_gps_time(week, tow, bias);
        Ok(true)
    }

    fn get_mid7_interval(&mut self, rinex: &mut RinexData) -> Result<bool, ConvError> {
        if self.message.payload_len() != 20 {
            info!("MID7 msg len <> 20");
            return Ok(false);
        }
        let week = self.message.get_u16()? as i32;
        let tow = self.message.get_u32()? as f64 / 100.0;
        let sats = self.message.get()?;
        if sats < self.min_svs_fix {
            trace!("MID7 ignored: solution only {} sats", sats);
            return Ok(false);
        }
        rinex.set_interval_time(week, tow);
        Ok(true)
    }

    // MID8: ten 50 bps subframe words from one channel, 43 bytes
    fn get_mid8_nav_data(&mut self, rinex: &mut RinexData) -> Result<bool, ConvError> {
        if self.message.payload_len() != 43 {
            info!("MID8 msg len <> 43");
            return Ok(false);
        }
        let channel = self.message.get()? as usize;
        let sv = self.message.get()?;
        if channel >= MAXCHANNELS {
            trace!("MID8 channel not in range");
            return Ok(false);
        }
        let mut words = [0u32; 10];
        for word in words.iter_mut() {
            *word = self.message.get_u32()?;
        }
        // a single failed word invalidates the whole burst
        if !words.iter().all(|&word| check_parity(word)) {
            trace!("MID8 parity not OK");
            return Ok(false);
        }
        for word in words.iter_mut() {
            *word = strip_parity(*word);
        }
        if let Some(dt) = self.subframes.feed(channel, sv, words) {
            if let Some((sat, bo)) = extract_ephemeris(&dt, rinex.gps_time()) {
                rinex.add_gps_nav(sat, bo);
            }
        }
        Ok(true)
    }

    // MID15: ephemeris data packaged by the receiver, 92 bytes
    fn get_mid15_nav_data(&mut self, rinex: &mut RinexData) -> Result<bool, ConvError> {
        if self.message.payload_len() != 92 {
            info!("MID15 msg len <> 92");
            return Ok(false);
        }
        let _sv = self.message.get()?;
        let mut dt = [0u32; 45];
        for item in dt.iter_mut() {
            *item = self.message.get_u16()? as u32;
        }
        // MID15 carries no HOW data, zero those bits
        dt[1] &= 0xFF00;
        dt[2] &= 0x0003;
        match extract_ephemeris(&dt, rinex.gps_time()) {
            Some((sat, bo)) => {
                rinex.add_gps_nav(sat, bo);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // MID19: navigation parameters, 65 bytes; only the masks are of interest
    fn get_mid19_masks(&mut self, rtko: &mut RtkObservation) -> Result<bool, ConvError> {
        if self.message.payload_len() != 65 {
            info!("MID19 msg len <> 65");
            return Ok(false);
        }
        self.message.skip(19)?; // from SubID to DOP mask
        let elevation_mask = self.message.get_i16()? as f64;
        let snr_mask = self.message.get()? as f64;
        rtko.set_masks(elevation_mask / 10.0, snr_mask);
        Ok(true)
    }

    // MID28: per-satellite measurements, 56 bytes
    fn get_mid28_obs_data(
        &mut self,
        rinex: &mut RinexData,
        same_epoch: &mut bool,
    ) -> Result<bool, ConvError> {
        if self.message.payload_len() != 56 {
            info!("MID28 msg len <> 56");
            return Ok(false);
        }
        *same_epoch = false;
        let mut sys = 'G';
        let channel = self.message.get()?;
        self.message.get_u32()?; // receiver time tag, not used
        let mut sat_id = self.message.get()?;
        if sat_id > 100 {
            // SBAS satellites are biased by 100
            sys = 'S';
            sat_id -= 100;
        }
        let gps_sw_time = self.message.get_f64()?;
        let pseudorange = self.message.get_f64()?;
        let carrier_frequency = self.message.get_f32()? as f64;
        // carrier phase arrives in meters, converted here to cycles
        let carrier_phase = self.message.get_f64()? * L1WLINV;
        self.message.get_u16()?; // time in track, not used
        let sync_flags = self.message.get()?;
        // signal strength is the worst of the ten C/N0 values
        let mut strength = self.message.get()?;
        for _ in 1..10 {
            let cn0 = self.message.get()?;
            if cn0 < strength {
                strength = cn0;
            }
        }
        let strength_index = (strength / 6).clamp(1, 9);
        if sync_flags & 0x01 == 0 {
            // acquisition not complete for this channel
            info!(
                "MID28 data NOK. Ch:{} Eph:{} SV:{}{} SynchFlag:{}",
                channel, gps_sw_time, sys, sat_id, sync_flags
            );
            return Ok(false);
        }
        *same_epoch =
            rinex.add_measurement(sys, sat_id, "S1C", strength as f64, 0, 0, gps_sw_time);
        rinex.add_measurement(sys, sat_id, "C1C", pseudorange, 0, strength_index, gps_sw_time);
        // carrier phase is only valid once bit 1 reports phase lock; a raw
        // zero with the bit clear means "never measured"
        if sync_flags & 0x02 != 0 {
            rinex.add_measurement(
                sys,
                sat_id,
                "L1C",
                carrier_phase,
                0,
                strength_index,
                gps_sw_time,
            );
        }
        rinex.add_measurement(
            sys,
            sat_id,
            "D1C",
            carrier_frequency * L1WLINV,
            0,
            0,
            gps_sw_time,
        );
        Ok(true)
    }
}
