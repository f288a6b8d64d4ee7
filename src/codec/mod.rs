//! Compression engine seam.
//!
//! The container logic never touches the LZO transform directly; it goes
//! through the [`Codec`] trait.  A codec only has to turn one block into a
//! candidate compressed buffer and back again.  Whether the candidate is
//! actually used (or the block is stored verbatim) is decided by the block
//! layer, not here.
//!
//! # Tiers
//! The header records one of two fixed method/level pairs.  Anything that
//! asks for level 9 gets the `Best` tier; everything else gets `Speed`.

use thiserror::Error;

// ── Method ids (header byte) ─────────────────────────────────────────────────

pub const M_LZO1X_1:    u8 = 1;
pub const M_LZO1X_1_15: u8 = 2;
pub const M_LZO1X_999:  u8 = 3;

/// Display name for a header method id.
pub fn method_name(method: u8) -> &'static str {
    match method {
        M_LZO1X_1    => "LZO1X-1",
        M_LZO1X_1_15 => "LZO1X-1(15)",
        M_LZO1X_999  => "LZO1X-999",
        _            => "unknown",
    }
}

// ── Levels ───────────────────────────────────────────────────────────────────

pub const DEFAULT_COMPRESSION: i32 = -1;
pub const BEST_SPEED:          i32 = 3;
pub const BEST_COMPRESSION:    i32 = 9;

/// LZO library version reported in headers written by [`Lzo1xCodec`] (2.10).
pub const LZO_LIBRARY_VERSION: u16 = 0x20a0;

// ── Tier ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Speed,
    Best,
}

impl Tier {
    /// Map a caller level onto one of the two tiers.
    ///
    /// Levels are validated elsewhere; this mapping is total so the CLI can
    /// clamp first and call it without a second check.
    pub fn from_level(level: i32) -> Self {
        if level >= BEST_COMPRESSION { Tier::Best } else { Tier::Speed }
    }

    /// Method id written into the header.
    pub fn method(self) -> u8 {
        match self {
            Tier::Speed => M_LZO1X_1,
            Tier::Best  => M_LZO1X_999,
        }
    }

    /// Level byte written into the header.
    pub fn level(self) -> u8 {
        match self {
            Tier::Speed => BEST_SPEED as u8,
            Tier::Best  => BEST_COMPRESSION as u8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Speed => "speed",
            Tier::Best  => "best",
        }
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Compression error: {0}")]
    Compression(String),
    /// The inverse transform rejected its input.
    #[error("data corrupted: {0}")]
    CorruptData(String),
}

// ── Codec trait ──────────────────────────────────────────────────────────────

pub trait Codec: Send + Sync {
    fn name(&self) -> &'static str;
    /// Library version recorded in the header of streams written with this codec.
    fn version(&self) -> u16;
    fn compress(&self, data: &[u8], tier: Tier) -> Result<Vec<u8>, CodecError>;
    /// Must return exactly `expected_len` bytes or fail.
    fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>, CodecError>;
}

// ── Built-in codec implementations ──────────────────────────────────────────

/// LZO1X via the pure-Rust `lzokay-native` port.
///
/// `lzokay-native` has a single compression strategy, so both tiers produce
/// the same bytes; the tier still decides what the header advertises.
pub struct Lzo1xCodec;

impl Codec for Lzo1xCodec {
    fn name(&self) -> &'static str { "lzo1x" }
    fn version(&self) -> u16 { LZO_LIBRARY_VERSION }

    fn compress(&self, data: &[u8], _tier: Tier) -> Result<Vec<u8>, CodecError> {
        lzokay_native::compress(data).map_err(|e| CodecError::Compression(format!("{e:?}")))
    }

    fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>, CodecError> {
        let out = lzokay_native::decompress_all(data, Some(expected_len))
            .map_err(|e| CodecError::CorruptData(format!("{e:?}")))?;
        if out.len() != expected_len {
            return Err(CodecError::CorruptData(format!(
                "decompressed {} bytes, block declares {expected_len}",
                out.len()
            )));
        }
        Ok(out)
    }
}

/// Never shrinks anything, so every block it touches is stored verbatim.
pub struct StoredCodec;

impl Codec for StoredCodec {
    fn name(&self) -> &'static str { "stored" }
    fn version(&self) -> u16 { LZO_LIBRARY_VERSION }
    fn compress(&self, data: &[u8], _: Tier) -> Result<Vec<u8>, CodecError> { Ok(data.to_vec()) }
    fn decompress(&self, _: &[u8], expected_len: usize) -> Result<Vec<u8>, CodecError> {
        // Only reachable for blocks smaller on the wire than their raw size.
        Err(CodecError::CorruptData(format!(
            "stored codec cannot expand a block to {expected_len} bytes"
        )))
    }
}

/// The codec used when the caller does not supply one.
pub fn default_codec() -> Box<dyn Codec> {
    Box::new(Lzo1xCodec)
}
