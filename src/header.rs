//! Stream header: magic, versioned metadata fields, and the header checksum.
//!
//! # Layout (big-endian)
//! ```text
//! magic[9]            89 4C 5A 4F 00 0D 0A 1A 0A
//! version:u16         >= 0x0900
//! lib_version:u16
//! extract_version:u16 only when version >= 0x0940
//! method:u8
//! level:u8            only when version >= 0x0940
//! flags:u32
//! filter:u32          only when F_H_FILTER is set
//! mode:u32
//! mtime_low:u32
//! mtime_high:u32      only when version >= 0x0940
//! name_len:u8, name[name_len]
//! checksum:u32        Adler-32, or CRC-32 when F_H_CRC32 is set,
//!                     over every byte after the magic up to here
//! ```
//!
//! Decoded headers keep the raw field values.  Interpretations such as
//! "stdin streams have mode 0" live in accessors, so writing a decoded header
//! back out reproduces it byte for byte.

use std::borrow::Cow;
use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Utc};
use log::debug;

use crate::codec::Tier;
use crate::digest::{DigestKind, DigestReader, DigestSet};
use crate::error::{LzopError, Result};

pub const MAGIC: [u8; 9] = [0x89, 0x4C, 0x5A, 0x4F, 0x00, 0x0D, 0x0A, 0x1A, 0x0A];

/// Format version written by this crate.
pub const VERSION:              u16 = 0x1030;
/// Version-needed-to-extract written by this crate.
pub const EXTRACT_VERSION:      u16 = 0x0940;
/// Oldest format version accepted on read.
pub const MIN_VERSION:          u16 = 0x0900;
/// First version carrying extract_version, level and mtime_high.
pub const VERSION_EXTENDED:     u16 = 0x0940;
/// Versions below this carry no usable modification time.
pub const VERSION_MTIME:        u16 = 0x0120;

// ── Flags ────────────────────────────────────────────────────────────────────

pub const F_ADLER32_D:     u32 = 1 << 0;
pub const F_ADLER32_C:     u32 = 1 << 1;
pub const F_STDIN:         u32 = 1 << 2;
pub const F_STDOUT:        u32 = 1 << 3;
pub const F_NAME_DEFAULT:  u32 = 1 << 4;
pub const F_DOSISH:        u32 = 1 << 5;
pub const F_H_EXTRA_FIELD: u32 = 1 << 6;
pub const F_H_GMTDIFF:     u32 = 1 << 7;
pub const F_CRC32_D:       u32 = 1 << 8;
pub const F_CRC32_C:       u32 = 1 << 9;
pub const F_MULTIPART:     u32 = 1 << 10;
pub const F_H_FILTER:      u32 = 1 << 11;
pub const F_H_CRC32:       u32 = 1 << 12;
pub const F_H_PATH:        u32 = 1 << 13;
pub const F_MASK:          u32 = 1 << 14;

/// Every flag that selects a block checksum.
pub const BLOCK_CHECKSUM_FLAGS: u32 = F_ADLER32_D | F_ADLER32_C | F_CRC32_D | F_CRC32_C;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version:         u16,
    pub lib_version:     u16,
    pub extract_version: Option<u16>,
    pub method:          u8,
    pub level:           Option<u8>,
    pub flags:           u32,
    pub filter:          Option<u32>,
    /// Raw mode field; see [`Header::mode`].
    pub mode:            u32,
    pub mtime_low:       u32,
    pub mtime_high:      Option<u32>,
    pub name:            Vec<u8>,
}

impl Header {
    /// Build the header a writer emits.
    ///
    /// `checksum_flags` is masked to the block checksum bits plus
    /// `F_H_CRC32`.  An empty name marks the stream as stdin/stdout.
    pub fn for_writer(
        tier:           Tier,
        lib_version:    u16,
        checksum_flags: u32,
        name:           &str,
        mtime:          DateTime<Utc>,
    ) -> Result<Self> {
        if name.len() > u8::MAX as usize {
            return Err(LzopError::NameTooLong(name.len()));
        }
        let mut flags = checksum_flags & (BLOCK_CHECKSUM_FLAGS | F_H_CRC32);
        if name.is_empty() {
            flags |= F_STDIN | F_STDOUT;
        }
        let secs = mtime.timestamp();
        Ok(Self {
            version:         VERSION,
            lib_version,
            extract_version: Some(EXTRACT_VERSION),
            method:          tier.method(),
            level:           Some(tier.level()),
            flags,
            filter:          None,
            mode:            0,
            mtime_low:       secs as u32,
            mtime_high:      Some((secs >> 32) as u32),
            name:            name.as_bytes().to_vec(),
        })
    }

    #[inline]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    /// Algorithm protecting the header itself.
    pub fn checksum_kind(&self) -> DigestKind {
        if self.has_flag(F_H_CRC32) { DigestKind::Crc32 } else { DigestKind::Adler32 }
    }

    /// File mode; streams that came from stdin have none.
    pub fn mode(&self) -> u32 {
        if self.has_flag(F_STDIN) { 0 } else { self.mode }
    }

    /// Modification time, or the epoch for pre-0x0120 streams.
    pub fn mtime(&self) -> DateTime<Utc> {
        if self.version < VERSION_MTIME {
            return DateTime::<Utc>::default();
        }
        let secs = self.mtime_low as i64 | (self.mtime_high.unwrap_or(0) as i64) << 32;
        DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
    }

    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Bytes this header occupies on the wire, magic and checksum included.
    pub fn encoded_len(&self) -> u64 {
        let mut n = MAGIC.len() as u64 + 2 + 2 + 1 + 4 + 4 + 4 + 1 + 4;
        if self.version >= VERSION_EXTENDED {
            n += 2 + 1 + 4;
        }
        if self.has_flag(F_H_FILTER) {
            n += 4;
        }
        n + self.name.len() as u64
    }

    // ── Decode ───────────────────────────────────────────────────────────────

    /// Parse and verify a header.
    ///
    /// Both digests in `digests` are reset, fed every byte after the magic,
    /// and reset again before returning so the caller can reuse them for
    /// block checksums.
    pub fn read<R: Read>(mut reader: R, digests: &mut DigestSet) -> Result<Self> {
        let mut magic = [0u8; MAGIC.len()];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(LzopError::InvalidHeader("bad magic"));
        }

        digests.reset_all();
        let header = Self::read_fields(DigestReader::new(&mut reader, digests))?;
        let computed = digests.get(header.checksum_kind()).sum();
        digests.reset_all();

        let stored = reader.read_u32::<BigEndian>()?;
        if stored != computed {
            return Err(LzopError::InvalidHeader("header checksum mismatch"));
        }
        if header.method == 0 {
            return Err(LzopError::IncompatibleMethod(header.method));
        }

        debug!(
            "header: version={:#06x} method={} flags={:#010x} name={:?}",
            header.version, header.method, header.flags, header.name()
        );
        Ok(header)
    }

    fn read_fields<R: Read>(mut r: R) -> Result<Self> {
        let version = r.read_u16::<BigEndian>()?;
        if version < MIN_VERSION {
            return Err(LzopError::InvalidHeader("version too old"));
        }
        let lib_version = r.read_u16::<BigEndian>()?;

        let extended = version >= VERSION_EXTENDED;
        let extract_version = if extended {
            let v = r.read_u16::<BigEndian>()?;
            if v > version {
                return Err(LzopError::IncompatibleVersion(v));
            }
            if v < MIN_VERSION {
                return Err(LzopError::InvalidHeader("extract version too old"));
            }
            Some(v)
        } else {
            None
        };

        let method = r.read_u8()?;
        let level  = if extended { Some(r.read_u8()?) } else { None };

        let flags  = r.read_u32::<BigEndian>()?;
        let filter = if flags & F_H_FILTER != 0 { Some(r.read_u32::<BigEndian>()?) } else { None };

        let mode       = r.read_u32::<BigEndian>()?;
        let mtime_low  = r.read_u32::<BigEndian>()?;
        let mtime_high = if extended { Some(r.read_u32::<BigEndian>()?) } else { None };

        let name_len = r.read_u8()? as usize;
        let mut name = vec![0u8; name_len];
        r.read_exact(&mut name)?;

        Ok(Self {
            version,
            lib_version,
            extract_version,
            method,
            level,
            flags,
            filter,
            mode,
            mtime_low,
            mtime_high,
            name,
        })
    }

    // ── Encode ───────────────────────────────────────────────────────────────

    /// Write the header, computing its checksum with the algorithm selected
    /// by the flags.  `digests` is left reset.
    pub fn write<W: Write>(&self, mut writer: W, digests: &mut DigestSet) -> Result<()> {
        if self.name.len() > u8::MAX as usize {
            return Err(LzopError::NameTooLong(self.name.len()));
        }
        let extended = self.version >= VERSION_EXTENDED;

        let mut body = Vec::with_capacity(self.encoded_len() as usize);
        body.write_u16::<BigEndian>(self.version)?;
        body.write_u16::<BigEndian>(self.lib_version)?;
        if extended {
            body.write_u16::<BigEndian>(self.extract_version.unwrap_or(EXTRACT_VERSION))?;
        }
        body.write_u8(self.method)?;
        if extended {
            body.write_u8(self.level.unwrap_or(0))?;
        }
        body.write_u32::<BigEndian>(self.flags)?;
        if self.has_flag(F_H_FILTER) {
            body.write_u32::<BigEndian>(self.filter.unwrap_or(0))?;
        }
        body.write_u32::<BigEndian>(self.mode)?;
        body.write_u32::<BigEndian>(self.mtime_low)?;
        if extended {
            body.write_u32::<BigEndian>(self.mtime_high.unwrap_or(0))?;
        }
        body.write_u8(self.name.len() as u8)?;
        body.extend_from_slice(&self.name);

        let checksum = digests.checksum(self.checksum_kind(), &body);
        digests.reset_all();

        writer.write_all(&MAGIC)?;
        writer.write_all(&body)?;
        writer.write_u32::<BigEndian>(checksum)?;

        debug!(
            "header written: method={} level={:?} flags={:#010x}",
            self.method, self.level, self.flags
        );
        Ok(())
    }
}
