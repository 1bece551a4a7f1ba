//! Conversion of SiRF IV OSP binary message streams into RINEX observation
//! and GPS navigation files, plus the companion capture and RTK log tools.
//!
//! The input is a trimmed OSP file: a sequence of records made of a two byte
//! big-endian payload length followed by the payload, whose first byte is the
//! message identifier. See the SiRFstarIV One Socket Protocol ICD for the
//! message catalog.

pub mod basic;
pub mod convbin;
