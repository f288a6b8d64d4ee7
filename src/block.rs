//! Block framing.
//!
//! ```text
//! dst_len:u32                     uncompressed length; 0 ends the stream
//! src_len:u32                     bytes of payload on the wire, 0 < src_len <= dst_len
//! [d_adler32:u32] [d_crc32:u32]   per F_ADLER32_D / F_CRC32_D
//! [c_adler32:u32] [c_crc32:u32]   per F_ADLER32_C / F_CRC32_C, only when src_len < dst_len
//! payload[src_len]
//! ```
//!
//! A block with `src_len == dst_len` is stored verbatim.  It carries no
//! compressed-side fields: its compressed-side checksum is by definition the
//! decompressed-side value of the same algorithm.

use std::borrow::Cow;
use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{trace, warn};

use crate::codec::{Codec, Tier};
use crate::digest::{DigestKind, DigestSet};
use crate::error::{LzopError, Result};

/// Largest uncompressed block accepted or produced (64 MiB).
pub const MAX_BLOCK_SIZE: usize = 64 * 1024 * 1024;

/// Checksum fields of one side of a block, indexed by [`DigestKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksums {
    pub adler32: Option<u32>,
    pub crc32:   Option<u32>,
}

impl Checksums {
    pub fn get(&self, kind: DigestKind) -> Option<u32> {
        match kind {
            DigestKind::Adler32 => self.adler32,
            DigestKind::Crc32   => self.crc32,
        }
    }

    fn set(&mut self, kind: DigestKind, value: u32) {
        match kind {
            DigestKind::Adler32 => self.adler32 = Some(value),
            DigestKind::Crc32   => self.crc32   = Some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub dst_len:      u32,
    pub src_len:      u32,
    pub decompressed: Checksums,
    /// Fields actually present on the wire; empty for verbatim blocks.
    pub compressed:   Checksums,
}

impl BlockHeader {
    #[inline]
    pub fn is_verbatim(&self) -> bool {
        self.src_len == self.dst_len
    }

    /// Expected compressed-side checksum for `kind`.
    ///
    /// Verbatim blocks reuse the decompressed-side value.
    pub fn compressed_checksum(&self, kind: DigestKind) -> Option<u32> {
        if self.is_verbatim() {
            self.decompressed.get(kind)
        } else {
            self.compressed.get(kind)
        }
    }

    /// Bytes taken by the length and checksum fields.
    pub fn encoded_len(&self) -> u64 {
        let fields = [
            self.decompressed.adler32, self.decompressed.crc32,
            self.compressed.adler32,   self.compressed.crc32,
        ];
        8 + 4 * fields.iter().filter(|f| f.is_some()).count() as u64
    }

    /// Read the fields of the next block, leaving the reader at its payload.
    ///
    /// Returns `Ok(None)` on the zero-length sentinel.  `src_len` is checked
    /// against `dst_len` before any checksum field is consumed.
    pub fn read<R: Read>(mut reader: R, flags: u32) -> Result<Option<Self>> {
        let dst_len = reader.read_u32::<BigEndian>()?;
        if dst_len == 0 {
            return Ok(None);
        }
        let src_len = reader.read_u32::<BigEndian>()?;
        if src_len == 0 || src_len > dst_len {
            warn!("block length invariant violated: src_len={src_len} dst_len={dst_len}");
            return Err(LzopError::DataCorruption(format!(
                "compressed length {src_len} outside 1..={dst_len}"
            )));
        }
        if dst_len as usize > MAX_BLOCK_SIZE {
            warn!("block of {dst_len} bytes exceeds the 64 MiB limit");
            return Err(LzopError::DataCorruption(format!("block length {dst_len} too large")));
        }

        let mut decompressed = Checksums::default();
        for kind in DigestKind::WIRE_ORDER {
            if flags & kind.decompressed_flag() != 0 {
                decompressed.set(kind, reader.read_u32::<BigEndian>()?);
            }
        }
        let mut compressed = Checksums::default();
        if src_len < dst_len {
            for kind in DigestKind::WIRE_ORDER {
                if flags & kind.compressed_flag() != 0 {
                    compressed.set(kind, reader.read_u32::<BigEndian>()?);
                }
            }
        }

        Ok(Some(Self { dst_len, src_len, decompressed, compressed }))
    }

    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_u32::<BigEndian>(self.dst_len)?;
        writer.write_u32::<BigEndian>(self.src_len)?;
        for kind in DigestKind::WIRE_ORDER {
            if let Some(v) = self.decompressed.get(kind) {
                writer.write_u32::<BigEndian>(v)?;
            }
        }
        if !self.is_verbatim() {
            for kind in DigestKind::WIRE_ORDER {
                if let Some(v) = self.compressed.get(kind) {
                    writer.write_u32::<BigEndian>(v)?;
                }
            }
        }
        Ok(())
    }
}

/// Compress one chunk and build its frame.
///
/// Falls back to storing `data` verbatim when the codec cannot make it
/// strictly smaller.  Returns the header and the payload to write after it.
pub fn encode_block<'a>(
    data:    &'a [u8],
    codec:   &dyn Codec,
    tier:    Tier,
    flags:   u32,
    digests: &mut DigestSet,
) -> Result<(BlockHeader, Cow<'a, [u8]>)> {
    debug_assert!(!data.is_empty() && data.len() <= MAX_BLOCK_SIZE);

    let mut decompressed = Checksums::default();
    for kind in DigestKind::WIRE_ORDER {
        if flags & kind.decompressed_flag() != 0 {
            decompressed.set(kind, digests.checksum(kind, data));
        }
    }

    let candidate = codec.compress(data, tier)?;
    let payload: Cow<'a, [u8]> = if candidate.len() >= data.len() {
        Cow::Borrowed(data)
    } else {
        Cow::Owned(candidate)
    };

    let mut compressed = Checksums::default();
    if payload.len() < data.len() {
        for kind in DigestKind::WIRE_ORDER {
            if flags & kind.compressed_flag() != 0 {
                compressed.set(kind, digests.checksum(kind, &payload));
            }
        }
    }

    let header = BlockHeader {
        dst_len: data.len() as u32,
        src_len: payload.len() as u32,
        decompressed,
        compressed,
    };
    trace!(
        "block encoded: dst_len={} src_len={} verbatim={}",
        header.dst_len, header.src_len, header.is_verbatim()
    );
    Ok((header, payload))
}

/// Verify and expand one block payload.
pub fn decode_block(
    header:  &BlockHeader,
    payload: Vec<u8>,
    codec:   &dyn Codec,
    flags:   u32,
    digests: &mut DigestSet,
) -> Result<Vec<u8>> {
    for kind in DigestKind::WIRE_ORDER {
        if flags & kind.compressed_flag() == 0 {
            continue;
        }
        // A verbatim block without the matching decompressed field has
        // nothing to compare against.
        if let Some(expected) = header.compressed_checksum(kind) {
            verify(digests, kind, &payload, expected, "compressed")?;
        }
    }

    let data = if header.is_verbatim() {
        payload
    } else {
        codec.decompress(&payload, header.dst_len as usize)?
    };
    if data.len() != header.dst_len as usize {
        return Err(LzopError::DataCorruption(format!(
            "block expanded to {} bytes, header declares {}",
            data.len(),
            header.dst_len
        )));
    }

    for kind in DigestKind::WIRE_ORDER {
        if flags & kind.decompressed_flag() == 0 {
            continue;
        }
        if let Some(expected) = header.decompressed.get(kind) {
            verify(digests, kind, &data, expected, "decompressed")?;
        }
    }
    trace!("block decoded: dst_len={} src_len={}", header.dst_len, header.src_len);
    Ok(data)
}

fn verify(digests: &mut DigestSet, kind: DigestKind, data: &[u8], expected: u32, side: &str) -> Result<()> {
    let actual = digests.checksum(kind, data);
    if actual != expected {
        warn!("{side} {} mismatch: expected {expected:#010x}, got {actual:#010x}", kind.name());
        return Err(LzopError::DataCorruption(format!("{side} {} mismatch", kind.name())));
    }
    Ok(())
}
