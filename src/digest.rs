//! Running checksums used by the header and by every block.
//!
//! The stream format knows two algorithms, Adler-32 and CRC-32 (IEEE).  Both
//! are exposed behind the [`Digest`] trait; callers pick an instance by
//! [`DigestKind`] and never branch on the algorithm itself.
//!
//! # Wire order
//! Where both algorithms are enabled, the Adler-32 field always precedes the
//! CRC-32 field.  [`DigestKind::WIRE_ORDER`] encodes that rule.

use std::io::{self, Read};

use crate::header::{F_ADLER32_C, F_ADLER32_D, F_CRC32_C, F_CRC32_D};

/// A resettable running 32-bit checksum.
pub trait Digest {
    fn reset(&mut self);
    fn update(&mut self, data: &[u8]);
    fn sum(&self) -> u32;
}

// ── Implementations ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct Adler32Digest(adler::Adler32);

impl Digest for Adler32Digest {
    fn reset(&mut self)               { self.0 = adler::Adler32::new(); }
    fn update(&mut self, data: &[u8]) { self.0.write_slice(data); }
    fn sum(&self) -> u32              { self.0.checksum() }
}

#[derive(Clone, Default)]
pub struct Crc32Digest(crc32fast::Hasher);

impl Digest for Crc32Digest {
    fn reset(&mut self)               { self.0.reset(); }
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn sum(&self) -> u32              { self.0.clone().finalize() }
}

// ── DigestKind ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    Adler32,
    Crc32,
}

impl DigestKind {
    /// Order in which checksum fields of one side appear in a block.
    pub const WIRE_ORDER: [DigestKind; 2] = [DigestKind::Adler32, DigestKind::Crc32];

    /// Header flag announcing this checksum over decompressed block data.
    #[inline]
    pub fn decompressed_flag(self) -> u32 {
        match self {
            DigestKind::Adler32 => F_ADLER32_D,
            DigestKind::Crc32   => F_CRC32_D,
        }
    }

    /// Header flag announcing this checksum over compressed block data.
    #[inline]
    pub fn compressed_flag(self) -> u32 {
        match self {
            DigestKind::Adler32 => F_ADLER32_C,
            DigestKind::Crc32   => F_CRC32_C,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DigestKind::Adler32 => "adler32",
            DigestKind::Crc32   => "crc32",
        }
    }
}

// ── DigestSet ────────────────────────────────────────────────────────────────

/// One instance of each algorithm, owned by a reader, writer or indexer.
#[derive(Clone, Default)]
pub struct DigestSet {
    adler32: Adler32Digest,
    crc32:   Crc32Digest,
}

impl DigestSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_mut(&mut self, kind: DigestKind) -> &mut dyn Digest {
        match kind {
            DigestKind::Adler32 => &mut self.adler32,
            DigestKind::Crc32   => &mut self.crc32,
        }
    }

    pub fn get(&self, kind: DigestKind) -> &dyn Digest {
        match kind {
            DigestKind::Adler32 => &self.adler32,
            DigestKind::Crc32   => &self.crc32,
        }
    }

    pub fn reset_all(&mut self) {
        self.adler32.reset();
        self.crc32.reset();
    }

    pub fn update_all(&mut self, data: &[u8]) {
        self.adler32.update(data);
        self.crc32.update(data);
    }

    /// Reset `kind`, feed it `data`, and return the sum.
    pub fn checksum(&mut self, kind: DigestKind, data: &[u8]) -> u32 {
        let d = self.get_mut(kind);
        d.reset();
        d.update(data);
        d.sum()
    }
}

// ── DigestReader ─────────────────────────────────────────────────────────────

/// Passes reads through while feeding every byte into both digests.
///
/// The header parser wraps its source in this so the header checksum can be
/// evaluated with whichever algorithm the flags select once parsing is done.
pub struct DigestReader<'a, R: Read> {
    inner:   R,
    digests: &'a mut DigestSet,
}

impl<'a, R: Read> DigestReader<'a, R> {
    pub fn new(inner: R, digests: &'a mut DigestSet) -> Self {
        Self { inner, digests }
    }
}

impl<R: Read> Read for DigestReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.digests.update_all(&buf[..n]);
        Ok(n)
    }
}
