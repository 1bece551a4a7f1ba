//! GPS time arithmetic and the standard RINEX file naming scheme.
//!
//! GPS time is carried as a week number from 1980-01-06 plus seconds into the
//! week. Internally an absolute time is an integer count of seconds since the
//! Unix epoch plus a fractional part, so that the fraction survives calendar
//! conversions unchanged.

use chrono::{Datelike, Local, Timelike};

const GPST0: [f64; 6] = [1980.0, 1.0, 6.0, 0.0, 0.0, 0.0];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GTime {
    pub time: i64,
    pub sec: f64,
}

pub fn timeadd(mut t: GTime, sec: f64) -> GTime {
    t.sec += sec;
    let tt = t.sec.floor();
    t.time += tt as i64;
    t.sec -= tt;
    t
}

pub fn timediff(t1: GTime, t2: GTime) -> f64 {
    (t1.time - t2.time) as f64 + (t1.sec - t2.sec)
}

pub fn epoch2time(ep: &[f64; 6]) -> GTime {
    const DOY: [i32; 12] = [1, 32, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];

    let mut time = GTime::default();
    let year = ep[0] as i32;
    let mon = ep[1] as i32;
    let day = ep[2] as i32;

    if !(1970..=2099).contains(&year) || !(1..=12).contains(&mon) {
        return time;
    }

    // leap year if year%4==0 in 1901-2099
    let days = (year - 1970) * 365 + (year - 1969) / 4 + DOY[(mon - 1) as usize] + day - 2
        + if year % 4 == 0 && mon >= 3 { 1 } else { 0 };

    let sec = ep[5].floor();
    time.time = (days as i64) * 86400 + (ep[3] as i64) * 3600 + (ep[4] as i64) * 60 + sec as i64;
    time.sec = ep[5] - sec;
    time
}

pub fn time2epoch(t: GTime, ep: &mut [f64; 6]) {
    const MDAY: [i32; 48] = [
        31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31,
        30, 31, 31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31, 31, 28, 31, 30, 31, 30, 31, 31,
        30, 31, 30, 31,
    ];

    let days = (t.time / 86400) as i32;
    let sec = (t.time - (days as i64) * 86400) as i32;
    let mut day = days % 1461;
    let mut mon = 0;

    while mon < 48 {
        if day >= MDAY[mon] {
            day -= MDAY[mon];
        } else {
            break;
        }
        mon += 1;
    }

    ep[0] = 1970.0 + (days / 1461 * 4) as f64 + (mon / 12) as f64;
    ep[1] = (mon % 12 + 1) as f64;
    ep[2] = (day + 1) as f64;
    ep[3] = (sec / 3600) as f64;
    ep[4] = (sec % 3600 / 60) as f64;
    ep[5] = (sec % 60) as f64 + t.sec;
}

/// GPS week and time of week to absolute time
pub fn gpst2time(week: i32, sec: f64) -> GTime {
    let mut t = epoch2time(&GPST0);
    let mut s = sec;
    if !(-1E9..=1E9).contains(&sec) {
        s = 0.0;
    }
    t.time += 86400 * 7 * week as i64 + s.floor() as i64;
    t.sec = s - s.floor();
    t
}

/// day of year (1..366)
pub fn time2doy(t: GTime) -> i32 {
    let mut ep = [0.0; 6];
    time2epoch(t, &mut ep);
    ep[1] = 1.0;
    ep[2] = 1.0;
    ep[3] = 0.0;
    ep[4] = 0.0;
    ep[5] = 0.0;
    (timediff(t, epoch2time(&ep)) / 86400.0) as i32 + 1
}

/// remaining seconds modulo minute from a time of week
pub fn gps_seconds(tow: f64) -> f64 {
    tow - (tow / 60.0).floor() * 60.0
}

/// local date stamp for the PGM / RUN BY / DATE header line
pub fn local_timestamp() -> String {
    let now = Local::now();
    format!(
        "{:04}{:02}{:02} {:02}{:02}{:02} LCL",
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// default capture file name, yyyymmdd_HHMMSS.OSP from local time
pub fn capture_file_name() -> String {
    Local::now().format("%Y%m%d_%H%M%S.OSP").to_string()
}

/// Standard RINEX file name PPPPdddhmm.yyT from the first epoch GPS time:
/// day of year, hour of day encoded 'a'..'x', minute, two digit year. The
/// designator is padded with '-' to four characters.
pub fn rinex_file_name(designator: &str, week: i32, tow: f64, ftype: char) -> String {
    let t = gpst2time(week, tow);
    let mut ep = [0.0; 6];
    time2epoch(t, &mut ep);

    let mut name = format!("{}----", designator);
    name.truncate(4);
    format!(
        "{}{:03}{}{:02}.{:02}{}",
        name,
        time2doy(t),
        (b'a' + ep[3] as u8) as char,
        ep[4] as u8,
        (ep[0] as i32) % 100,
        ftype
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gps_epoch_maps_to_calendar() {
        let mut ep = [0.0; 6];
        time2epoch(gpst2time(0, 0.0), &mut ep);
        assert_eq!(ep[..5], [1980.0, 1.0, 6.0, 0.0, 0.0]);
        assert_eq!(ep[5], 0.0);
    }

    #[test]
    fn week_and_tow_roundtrip() {
        let t = gpst2time(2047, 345600.25);
        let mut ep = [0.0; 6];
        time2epoch(t, &mut ep);
        assert_eq!(epoch2time(&ep), t);
        assert!((timediff(t, gpst2time(2047, 0.0)) - 345600.25).abs() < 1e-9);
    }

    #[test]
    fn doy_of_year_start() {
        let t = epoch2time(&[2023.0, 1.0, 1.0, 12.0, 0.0, 0.0]);
        assert_eq!(time2doy(t), 1);
        let t = epoch2time(&[2020.0, 12.0, 31.0, 0.0, 0.0, 0.0]);
        assert_eq!(time2doy(t), 366); // leap year
    }

    #[test]
    fn file_name_encoding() {
        // week 2000, tow 0 is 2018-05-06 00:00:00, day of year 126, hour 'a'
        assert_eq!(rinex_file_name("PNT1", 2000, 0.0, 'O'), "PNT1126a00.18O");
        // hour 23 encodes as 'x', designator padded with '-'
        assert_eq!(
            rinex_file_name("AB", 2000, 23.0 * 3600.0 + 59.0 * 60.0, 'N'),
            "AB--126x59.18N"
        );
    }

    #[test]
    fn gps_seconds_keeps_fraction() {
        assert!((gps_seconds(345661.5) - 1.5).abs() < 1e-9);
        assert_eq!(gps_seconds(120.0), 0.0);
    }
}
