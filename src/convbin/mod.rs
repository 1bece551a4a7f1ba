//! Conversion of trimmed OSP binary streams into RINEX, RTK and capture files.

use std::io;
use thiserror::Error;

pub mod acq;
pub mod convert;
pub mod message;
pub mod rinex;
pub mod rtk;
pub mod subframe;

#[derive(Debug, Error)]
pub enum ConvError {
    /// the stream ended inside a record, after its length header was read
    #[error("stream ended inside a message payload")]
    ShortRead,
    /// a typed field read ran past the end of the payload
    #[error("message field read beyond payload end")]
    Truncated,
    /// version 2.10 requires every system to carry the same observable list
    #[error("all systems must share the same observables in version 2.10 files")]
    ObsTypesMismatch,
    #[error(transparent)]
    Io(#[from] io::Error),
}
