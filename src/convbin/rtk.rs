//! RTK style position log built from the receiver solutions.
//!
//! The header carries the observation span, the receiver masks and fixed
//! descriptors of the single-point solution the receiver computes; the body
//! is one line per epoch solution.

use std::io::{self, Write};

use crate::basic::time::{gps_seconds, gpst2time, time2epoch};

pub struct RtkObservation {
    program: String,
    inp_file: String,
    pos_mode: String,
    elev_mask: f64,
    snr_mask: f64,
    ionos_est: String,
    tropos_est: String,
    ephemeris: String,
    start_week: i32,
    start_tow: f64,
    end_week: i32,
    end_tow: f64,
    gps_week: i32,
    gps_tow: f64,
    x_sol: f64,
    y_sol: f64,
    z_sol: f64,
    q_sol: u8,
    n_sol: u8,
}

impl RtkObservation {
    pub fn new(program: &str, inp_file: &str) -> Self {
        RtkObservation {
            program: program.to_string(),
            inp_file: inp_file.to_string(),
            pos_mode: "Single".to_string(),
            elev_mask: 0.0,
            snr_mask: 0.0,
            ionos_est: "Broadcast".to_string(),
            tropos_est: "OFF".to_string(),
            ephemeris: "Broadcast".to_string(),
            start_week: 0,
            start_tow: 0.0,
            end_week: 0,
            end_tow: 0.0,
            gps_week: 0,
            gps_tow: 0.0,
            x_sol: 0.0,
            y_sol: 0.0,
            z_sol: 0.0,
            q_sol: 0,
            n_sol: 0,
        }
    }

    pub fn set_masks(&mut self, elev: f64, snr: f64) {
        self.elev_mask = elev;
        self.snr_mask = snr;
    }

    /// Mark the current epoch as the start of the observation span.
    pub fn set_start_time(&mut self) {
        self.start_week = self.gps_week;
        self.start_tow = self.gps_tow;
    }

    /// Mark the current epoch as the end of the observation span.
    pub fn set_end_time(&mut self) {
        self.end_week = self.gps_week;
        self.end_tow = self.gps_tow;
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_position(
        &mut self,
        week: i32,
        tow: f64,
        x: f64,
        y: f64,
        z: f64,
        quality: u8,
        n_sat: u8,
    ) {
        self.gps_week = week;
        self.gps_tow = tow;
        self.x_sol = x;
        self.y_sol = y;
        self.z_sol = z;
        self.q_sol = quality;
        self.n_sol = n_sat;
    }

    fn time_stamp(week: i32, tow: f64) -> String {
        let mut ep = [0.0; 6];
        time2epoch(gpst2time(week, tow), &mut ep);
        format!(
            "{:04}/{:02}/{:02} {:02}:{:02}:{:06.3}",
            ep[0] as i32,
            ep[1] as u8,
            ep[2] as u8,
            ep[3] as u8,
            ep[4] as u8,
            gps_seconds(tow)
        )
    }

    pub fn write_header<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "% program\t: {}", self.program)?;
        writeln!(w, "% inp file\t: {}", self.inp_file)?;
        writeln!(
            w,
            "% obs start\t: {} GPST",
            Self::time_stamp(self.start_week, self.start_tow)
        )?;
        writeln!(
            w,
            "% obs end\t: {} GPST",
            Self::time_stamp(self.end_week, self.end_tow)
        )?;
        writeln!(w, "% pos mode\t: {}", self.pos_mode)?;
        writeln!(w, "% elev mask\t: {:4.1}", self.elev_mask)?;
        writeln!(w, "% snr mask\t: {:4.1}", self.snr_mask)?;
        writeln!(w, "% ionos opt\t: {}", self.ionos_est)?;
        writeln!(w, "% tropo opt\t: {}", self.tropos_est)?;
        writeln!(w, "% ephemeris\t: {}", self.ephemeris)?;
        writeln!(
            w,
            "%\n% (x/y/z-ecef=WGS84,Q=1:fix,2:float,3:sbas,4:dgps,5:single,6:ppp,ns=# of satellites)"
        )?;
        writeln!(
            w,
            "%  GPST{:19}{}",
            "",
            "   x-ecef(m)      y-ecef(m)      z-ecef(m)   Q  ns   sdx(m)   sdy(m)   sdz(m)  sdxy(m)  sdyz(m)  sdzx(m) age(s)  ratio"
        )?;
        Ok(())
    }

    /// One line with the solution of the current epoch. The standard
    /// deviation, age and ratio columns have no OSP source and print as zero.
    pub fn write_solution<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "{}", Self::time_stamp(self.gps_week, self.gps_tow))?;
        write!(
            w,
            " {:14.4} {:14.4} {:14.4} {:3} {:3}",
            self.x_sol, self.y_sol, self.z_sol, self.q_sol, self.n_sol
        )?;
        for _ in 0..6 {
            write!(w, " {:8.4}", 0.0)?;
        }
        writeln!(w, "   0.00    0.0")?;
        Ok(())
    }
}
