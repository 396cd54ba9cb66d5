//! Error type shared by the whole crate.
//!
//! Frames that simply fail to decode are not errors: decoders return
//! `None` and the pipeline keeps scanning. Only contract violations and
//! stream failures surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid bit field size: {size} (must be in 1..32)")]
    InvalidSize { size: u32 },

    #[error("bit range out of bounds: start {start}, size {size}")]
    OutOfRange { start: u32, size: u32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("aircraft database error: {0}")]
    Database(String),
}

pub type Result<T> = std::result::Result<T, Error>;
