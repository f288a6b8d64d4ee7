//! Error taxonomy shared by the header, block, stream and index layers.
//!
//! Every variant is terminal for the operation that produced it.  Nothing in
//! this crate retries; the caller decides whether to reopen and try again.
//! Normal end of stream (the zero-length sentinel block) is never an error.

use std::io;
use thiserror::Error;

use crate::codec::CodecError;

#[derive(Error, Debug)]
pub enum LzopError {
    /// Bad magic, header checksum mismatch, or a malformed fixed field.
    #[error("lzo: invalid header ({0})")]
    InvalidHeader(&'static str),
    /// Version needed to extract is newer than the stream's own version.
    #[error("lzo: incompatible version (needs {0:#06x})")]
    IncompatibleVersion(u16),
    #[error("lzo: incompatible method {0}")]
    IncompatibleMethod(u8),
    /// Block length invariant violated or a block checksum did not match.
    #[error("lzo: data corruption ({0})")]
    DataCorruption(String),
    #[error("lzo: {0}")]
    Codec(#[from] CodecError),
    #[error("lzo: invalid compression level: {0}")]
    InvalidLevel(i32),
    #[error("lzo: name is {0} bytes, at most 255 fit in the header")]
    NameTooLong(usize),
    #[error("lzo: write to a closed writer")]
    WriterClosed,
    #[error("lzo: header already written")]
    HeaderAlreadyWritten,
    /// The stream hit a terminal error earlier and cannot continue.
    #[error("lzo: stream already failed")]
    StreamFailed,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<LzopError> for io::Error {
    fn from(e: LzopError) -> Self {
        match e {
            LzopError::Io(inner) => inner,
            other @ (LzopError::WriterClosed
            | LzopError::HeaderAlreadyWritten
            | LzopError::InvalidLevel(_)
            | LzopError::NameTooLong(_)) => io::Error::new(io::ErrorKind::Other, other),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LzopError>;
