//! Constants and data types shared by the OSP decoding and RINEX generation modules.

use std::str::FromStr;

pub const CLIGHT: f64 = 299792458.0; // speed of light (m/s)

pub const FREQ1: f64 = 1.57542E9; // L1 carrier frequency (Hz)
pub const FREQ2: f64 = 1.22760E9; // L2 frequency (Hz)
pub const FREQ5: f64 = 1.17645E9; // L5/E5a frequency (Hz)
pub const FREQ6: f64 = 1.27875E9; // E6 frequency (Hz)
pub const FREQ7: f64 = 1.20714E9; // E5b frequency (Hz)
pub const FREQ8: f64 = 1.191795E9; // E5a+b frequency (Hz)

/// inverse of the L1 wave length (cycles per meter)
pub const L1WLINV: f64 = FREQ1 / CLIGHT;

pub const PI: f64 = std::f64::consts::PI;

/// observable limits of the F14.3 RINEX field
pub const MAXOBSVAL: f64 = 9999999999.999;
pub const MINOBSVAL: f64 = -999999999.999;

/// receiver tracking channels carrying 50 bps data
pub const MAXCHANNELS: usize = 12;
/// subframe slots kept per channel: 1, 2, 3 plus page 18 of subframe 4
pub const MAXSUBFR: usize = 4;

pub const SECONDS_WEEK: f64 = 604800.0;

// GPS week numbers in OSP messages roll over at 1024. The receiver family
// predates the 2019 rollover, so a single unroll is applied; a later
// generation would need this parameterized.
pub const GPS_WEEK_ROLLOVER: i32 = 1024;

/// RINEX format versions the generator can print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RnxVer {
    V210,
    V300,
}

impl FromStr for RnxVer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "V210" => Ok(RnxVer::V210),
            "V300" => Ok(RnxVer::V300),
            _ => Err(format!("unknown RINEX version: {}", s)),
        }
    }
}

/// One GNSS system contributing observables to the RINEX file.
///
/// The bias factor converts the receiver clock bias (seconds) into the
/// correction for each observable: speed of light for code measurements,
/// carrier frequency for phase, zero otherwise.
#[derive(Debug, Clone)]
pub struct GnssSystem {
    pub system: char,
    pub obs_types: Vec<String>,
    pub bias_factor: Vec<f64>,
}

impl GnssSystem {
    pub fn new(system: char, obs_types: Vec<String>) -> Self {
        let bias_factor = obs_types
            .iter()
            .map(|t| {
                if t.starts_with('C') {
                    CLIGHT
                } else if t.starts_with("L1") {
                    FREQ1
                } else if t.starts_with("L2") {
                    FREQ2
                } else if t.starts_with("L5") {
                    FREQ5
                } else if t.starts_with("L6") {
                    FREQ6
                } else if t.starts_with("L7") {
                    FREQ7
                } else if t.starts_with("L8") {
                    FREQ8
                } else {
                    0.0
                }
            })
            .collect();
        GnssSystem {
            system,
            obs_types,
            bias_factor,
        }
    }
}

/// A single satellite observation inside one epoch.
#[derive(Debug, Clone)]
pub struct SatObsData {
    pub sys_index: usize,
    pub satellite: u8,
    pub epoch_time: f64,
    pub obs_type_index: usize,
    pub obs_value: f64,
    pub loss_of_lock: u8,
    pub strength: u8,
}

/// Broadcast ephemeris of one GPS satellite, kept as the raw bit patterns of
/// the eight RINEX navigation lines (four fields each). Scale factors are
/// applied at print time.
#[derive(Debug, Clone)]
pub struct GpsSatNav {
    pub satellite: u8,
    pub broadcast_orbit: [[u32; 4]; 8],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bias_factors_follow_observable_kind() {
        let sys = GnssSystem::new(
            'G',
            vec![
                "C1C".to_string(),
                "L1C".to_string(),
                "D1C".to_string(),
                "S1C".to_string(),
            ],
        );
        assert_eq!(sys.bias_factor[0], CLIGHT);
        assert_eq!(sys.bias_factor[1], FREQ1);
        assert_eq!(sys.bias_factor[2], 0.0);
        assert_eq!(sys.bias_factor[3], 0.0);
    }

    #[test]
    fn bias_factor_per_band() {
        let sys = GnssSystem::new('G', vec!["L2X".to_string(), "L5Q".to_string()]);
        assert_eq!(sys.bias_factor[0], FREQ2);
        assert_eq!(sys.bias_factor[1], FREQ5);
    }

    #[test]
    fn version_parse() {
        assert_eq!("V210".parse::<RnxVer>().ok(), Some(RnxVer::V210));
        assert_eq!("V300".parse::<RnxVer>().ok(), Some(RnxVer::V300));
        assert!("V211".parse::<RnxVer>().is_err());
    }
}
