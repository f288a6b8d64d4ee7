//! Streaming engine: decompressing reader and compressing writer.
//!
//! # Reader
//! [`LzopReader`] parses the header on first use, then pulls one block at a
//! time, verifies it, and serves bytes from an internal buffer until it is
//! drained.  The zero-length sentinel ends the stream; `read` returns `Ok(0)`
//! from then on.  Any error is terminal: later calls fail with
//! [`LzopError::StreamFailed`].
//!
//! # Writer
//! [`LzopWriter`] emits nothing until the first non-empty write.  That write
//! binds the compression tier, emits the header, and becomes the first block.
//! Every later write is framed as exactly one block (capped at
//! [`MAX_BLOCK_SIZE`]).  `close()` appends the sentinel.  A sink error
//! leaves a partial header or frame behind, so it is terminal as well: later
//! calls fail with [`LzopError::StreamFailed`] until [`LzopWriter::reset`].
//!
//! # Endianness
//! All fields are big-endian; see `header.rs` and `block.rs` for layouts.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, WriteBytesExt};
use chrono::{DateTime, Utc};
use log::{debug, trace};

use crate::block::{decode_block, encode_block, BlockHeader, MAX_BLOCK_SIZE};
use crate::codec::{default_codec, Codec, Tier, BEST_COMPRESSION, DEFAULT_COMPRESSION};
use crate::digest::DigestSet;
use crate::error::{LzopError, Result};
use crate::header::{Header, F_ADLER32_D, F_CRC32_D};

// ── Reader ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    HeaderPending,
    Streaming,
    Exhausted,
    Failed,
}

pub struct LzopReader<R: Read> {
    reader:  R,
    codec:   Box<dyn Codec>,
    header:  Option<Header>,
    digests: DigestSet,
    /// Decompressed bytes not yet handed to the caller.
    pending: Vec<u8>,
    pos:     usize,
    state:   ReaderState,
}

impl<R: Read> LzopReader<R> {
    /// Wrap `reader`; the header is parsed on first use.
    pub fn new(reader: R) -> Self {
        Self::with_codec(reader, default_codec())
    }

    pub fn with_codec(reader: R, codec: Box<dyn Codec>) -> Self {
        Self {
            reader,
            codec,
            header:  None,
            digests: DigestSet::new(),
            pending: Vec::new(),
            pos:     0,
            state:   ReaderState::HeaderPending,
        }
    }

    /// Wrap `reader` and parse the header immediately.
    pub fn open(reader: R) -> Result<Self> {
        let mut z = Self::new(reader);
        z.header()?;
        Ok(z)
    }

    /// The stream header, parsing it first if needed.
    pub fn header(&mut self) -> Result<&Header> {
        self.ensure_header()?;
        self.header.as_ref().ok_or(LzopError::StreamFailed)
    }

    /// True once the sentinel block has been read.
    pub fn is_exhausted(&self) -> bool {
        self.state == ReaderState::Exhausted
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Succeeds unless the stream hit an error; it does not require the
    /// sentinel to have been reached.
    pub fn close(self) -> Result<R> {
        match self.state {
            ReaderState::Failed => Err(LzopError::StreamFailed),
            _                   => Ok(self.reader),
        }
    }

    fn ensure_header(&mut self) -> Result<()> {
        match self.state {
            ReaderState::HeaderPending => {}
            ReaderState::Failed        => return Err(LzopError::StreamFailed),
            _                          => return Ok(()),
        }
        match Header::read(&mut self.reader, &mut self.digests) {
            Ok(h) => {
                self.header = Some(h);
                self.state  = ReaderState::Streaming;
                Ok(())
            }
            Err(e) => {
                self.state = ReaderState::Failed;
                Err(e)
            }
        }
    }

    /// Pull, verify and buffer the next block.
    fn next_block(&mut self) -> Result<()> {
        let flags = match &self.header {
            Some(h) => h.flags,
            None    => return Err(LzopError::StreamFailed),
        };
        let Some(block) = BlockHeader::read(&mut self.reader, flags)? else {
            debug!("sentinel reached");
            self.state = ReaderState::Exhausted;
            return Ok(());
        };

        let mut payload = vec![0u8; block.src_len as usize];
        self.reader.read_exact(&mut payload)?;
        let data = decode_block(&block, payload, self.codec.as_ref(), flags, &mut self.digests)?;

        self.pending = data;
        self.pos     = 0;
        Ok(())
    }

    /// Fill `buf` from the buffered block, pulling blocks as needed.
    fn read_inner(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_header()?;
        loop {
            if self.pos < self.pending.len() {
                let n = buf.len().min(self.pending.len() - self.pos);
                buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            match self.state {
                ReaderState::Exhausted => return Ok(0),
                ReaderState::Failed    => return Err(LzopError::StreamFailed),
                _                      => {}
            }
            if buf.is_empty() {
                return Ok(0);
            }
            if let Err(e) = self.next_block() {
                self.state = ReaderState::Failed;
                return Err(e);
            }
        }
    }
}

impl<R: Read> Read for LzopReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_inner(buf).map_err(io::Error::from)
    }
}

// ── Writer ───────────────────────────────────────────────────────────────────

/// Header and block policy for [`LzopWriter`].
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// `-1..=9`; 9 selects the best tier, everything else the speed tier.
    pub level: i32,
    /// Stored in the header; `None` marks the stream as stdin/stdout.
    pub name:  Option<String>,
    /// Defaults to the time the header is emitted.
    pub mtime: Option<DateTime<Utc>>,
    /// Block checksum flags, optionally with `F_H_CRC32`.
    pub flags: u32,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESSION,
            name:  None,
            mtime: None,
            flags: F_ADLER32_D | F_CRC32_D,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Unopened,
    Writing,
    Closed,
    Failed,
}

pub struct LzopWriter<W: Write> {
    writer:  W,
    codec:   Box<dyn Codec>,
    options: WriterOptions,
    /// Header flags once emitted.
    flags:   u32,
    /// Bound on first payload write.
    tier:    Option<Tier>,
    digests: DigestSet,
    state:   WriterState,
}

impl<W: Write> LzopWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::build(writer, WriterOptions::default(), default_codec())
    }

    pub fn with_level(writer: W, level: i32) -> Result<Self> {
        Self::with_options(writer, WriterOptions { level, ..WriterOptions::default() })
    }

    pub fn with_options(writer: W, options: WriterOptions) -> Result<Self> {
        Self::with_codec(writer, options, default_codec())
    }

    pub fn with_codec(writer: W, options: WriterOptions, codec: Box<dyn Codec>) -> Result<Self> {
        if !(DEFAULT_COMPRESSION..=BEST_COMPRESSION).contains(&options.level) {
            return Err(LzopError::InvalidLevel(options.level));
        }
        if let Some(name) = &options.name {
            if name.len() > u8::MAX as usize {
                return Err(LzopError::NameTooLong(name.len()));
            }
        }
        Ok(Self::build(writer, options, codec))
    }

    fn build(writer: W, options: WriterOptions, codec: Box<dyn Codec>) -> Self {
        Self {
            writer,
            codec,
            options,
            flags:   0,
            tier:    None,
            digests: DigestSet::new(),
            state:   WriterState::Unopened,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.ensure_unopened()?;
        let name = name.into();
        if name.len() > u8::MAX as usize {
            return Err(LzopError::NameTooLong(name.len()));
        }
        self.options.name = Some(name);
        Ok(())
    }

    pub fn set_mtime(&mut self, mtime: DateTime<Utc>) -> Result<()> {
        self.ensure_unopened()?;
        self.options.mtime = Some(mtime);
        Ok(())
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Tier bound by the first payload write, if any.
    pub fn tier(&self) -> Option<Tier> {
        self.tier
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    fn ensure_unopened(&self) -> Result<()> {
        match self.state {
            WriterState::Unopened => Ok(()),
            WriterState::Writing  => Err(LzopError::HeaderAlreadyWritten),
            WriterState::Closed   => Err(LzopError::WriterClosed),
            WriterState::Failed   => Err(LzopError::StreamFailed),
        }
    }

    /// Mark the writer failed if `result` is an error; the sink may hold a
    /// partial header or frame and must not be appended to.
    fn sticky<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.state = WriterState::Failed;
        }
        result
    }

    /// Bind the tier and emit the header.
    fn open(&mut self) -> Result<()> {
        let tier = Tier::from_level(self.options.level);
        let mtime = self.options.mtime.unwrap_or_else(Utc::now);
        let name = self.options.name.as_deref().unwrap_or("");
        let header = Header::for_writer(tier, self.codec.version(), self.options.flags, name, mtime)?;
        header.write(&mut self.writer, &mut self.digests)?;

        debug!("writer opened: tier={} codec={}", tier.name(), self.codec.name());
        self.flags = header.flags;
        self.tier  = Some(tier);
        self.state = WriterState::Writing;
        Ok(())
    }

    /// Frame `data` as one block, emitting the header first if needed.
    ///
    /// An empty slice writes nothing.  Slices longer than
    /// [`MAX_BLOCK_SIZE`] are rejected; `io::Write::write` truncates instead.
    pub fn write_block(&mut self, data: &[u8]) -> Result<usize> {
        match self.state {
            WriterState::Closed => return Err(LzopError::WriterClosed),
            WriterState::Failed => return Err(LzopError::StreamFailed),
            _ => {}
        }
        if data.is_empty() {
            return Ok(0);
        }
        if data.len() > MAX_BLOCK_SIZE {
            return Err(LzopError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("block of {} bytes exceeds the 64 MiB limit", data.len()),
            )));
        }
        let result = self.write_frame(data);
        self.sticky(result)
    }

    fn write_frame(&mut self, data: &[u8]) -> Result<usize> {
        if self.state == WriterState::Unopened {
            self.open()?;
        }
        let tier = self.tier.unwrap_or(Tier::Speed);

        let (header, payload) = encode_block(data, self.codec.as_ref(), tier, self.flags, &mut self.digests)?;
        header.write(&mut self.writer)?;
        self.writer.write_all(&payload)?;
        trace!("wrote block: {} -> {} bytes", header.dst_len, header.src_len);
        Ok(data.len())
    }

    /// Write the sentinel.  A writer that never saw payload emits its header
    /// first, so the result is always a valid (possibly empty) stream.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            WriterState::Closed   => return Err(LzopError::WriterClosed),
            WriterState::Failed   => return Err(LzopError::StreamFailed),
            WriterState::Unopened | WriterState::Writing => {}
        }
        let result = self.write_sentinel();
        self.sticky(result)?;
        self.state = WriterState::Closed;
        Ok(())
    }

    fn write_sentinel(&mut self) -> Result<()> {
        if self.state == WriterState::Unopened {
            self.open()?;
        }
        self.writer.write_u32::<BigEndian>(0)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Close and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.close()?;
        Ok(self.writer)
    }

    /// Point the writer at a new sink as if freshly constructed with the
    /// same options.  Returns the previous sink untouched.
    pub fn reset(&mut self, writer: W) -> W {
        self.flags   = 0;
        self.tier    = None;
        self.state   = WriterState::Unopened;
        self.digests = DigestSet::new();
        std::mem::replace(&mut self.writer, writer)
    }
}

impl<W: Write> Write for LzopWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(MAX_BLOCK_SIZE);
        self.write_block(&buf[..n]).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Checksums;
    use crate::codec::{CodecError, StoredCodec, LZO_LIBRARY_VERSION};
    use crate::header::{F_ADLER32_C, F_CRC32_C, F_STDIN, MAGIC};
    use std::io::Cursor;

    fn fixed_mtime() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_600_000_000, 0).unwrap()
    }

    fn compress_chunks(chunks: &[&[u8]], options: WriterOptions) -> Vec<u8> {
        let mut w = LzopWriter::with_options(Vec::new(), options).unwrap();
        for c in chunks {
            w.write_block(c).unwrap();
        }
        w.finish().unwrap()
    }

    fn read_all(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        LzopReader::new(bytes).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn abc_scenario() {
        let opts = WriterOptions { mtime: Some(fixed_mtime()), ..WriterOptions::default() };
        let bytes = compress_chunks(&[b"abc"], opts);

        let mut cursor = Cursor::new(&bytes);
        let header = Header::read(&mut cursor, &mut DigestSet::new()).unwrap();
        assert_eq!(header.method, Tier::Speed.method());
        assert_eq!(header.level, Some(Tier::Speed.level()));
        assert!(header.has_flag(F_ADLER32_D) && header.has_flag(F_CRC32_D));

        let block = BlockHeader::read(&mut cursor, header.flags).unwrap().unwrap();
        assert_eq!(block.dst_len, 3);
        assert!(block.src_len <= 3);
        assert!(block.decompressed.adler32.is_some() && block.decompressed.crc32.is_some());

        // header + 8 length bytes + 2 checksums + payload + sentinel
        let expected_len = header.encoded_len() + 8 + 8 + block.src_len as u64 + 4;
        assert_eq!(bytes.len() as u64, expected_len);
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);

        let mut reader = LzopReader::new(&bytes[..]);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");
        assert!(reader.is_exhausted());
        assert!(reader.close().is_ok());
    }

    #[test]
    fn no_output_before_first_payload() {
        let mut w = LzopWriter::new(Vec::new());
        assert_eq!(w.write(&[]).unwrap(), 0);
        assert!(w.get_ref().is_empty());
        assert_eq!(w.tier(), None);
        w.write_all(b"payload").unwrap();
        assert!(w.get_ref().starts_with(&MAGIC));
        assert_eq!(w.tier(), Some(Tier::Speed));
    }

    #[test]
    fn best_tier_is_bound_at_open() {
        let bytes = compress_chunks(&[b"hello hello hello hello"], WriterOptions {
            level: 9,
            ..WriterOptions::default()
        });
        let header = LzopReader::new(&bytes[..]).header().unwrap().clone();
        assert_eq!(header.method, 3);
        assert_eq!(header.level, Some(9));
    }

    #[test]
    fn invalid_levels_are_rejected() {
        assert!(matches!(LzopWriter::with_level(Vec::new(), 10), Err(LzopError::InvalidLevel(10))));
        assert!(matches!(LzopWriter::with_level(Vec::new(), -2), Err(LzopError::InvalidLevel(-2))));
    }

    #[test]
    fn empty_stream_is_still_valid() {
        let bytes = LzopWriter::new(Vec::new()).finish().unwrap();
        assert!(bytes.starts_with(&MAGIC));
        assert!(read_all(&bytes).is_empty());
    }

    #[test]
    fn write_after_close_fails() {
        let mut w = LzopWriter::new(Vec::new());
        w.write_all(b"x").unwrap();
        w.close().unwrap();
        assert!(matches!(w.write_block(b"y"), Err(LzopError::WriterClosed)));
        assert!(matches!(w.close(), Err(LzopError::WriterClosed)));
    }

    #[test]
    fn metadata_is_frozen_after_open() {
        let mut w = LzopWriter::new(Vec::new());
        w.set_name("a.txt").unwrap();
        w.write_all(b"data").unwrap();
        assert!(matches!(w.set_name("b.txt"), Err(LzopError::HeaderAlreadyWritten)));
        let bytes = w.finish().unwrap();

        let mut r = LzopReader::open(&bytes[..]).unwrap();
        assert_eq!(r.header().unwrap().name(), "a.txt");
        assert!(!r.header().unwrap().has_flag(F_STDIN));
    }

    #[test]
    fn reset_starts_a_fresh_stream() {
        let opts = WriterOptions { mtime: Some(fixed_mtime()), ..WriterOptions::default() };
        let mut w = LzopWriter::with_options(Vec::new(), opts).unwrap();
        w.write_all(b"first").unwrap();
        let partial = w.reset(Vec::new());
        assert!(!partial.is_empty());
        assert_eq!(w.tier(), None);
        assert!(w.get_ref().is_empty());

        w.write_all(b"second").unwrap();
        let bytes = w.finish().unwrap();
        assert_eq!(read_all(&bytes), b"second");
    }

    #[test]
    fn each_write_is_one_block() {
        let opts = WriterOptions {
            flags: F_ADLER32_D | F_CRC32_D | F_ADLER32_C | F_CRC32_C,
            ..WriterOptions::default()
        };
        let chunks: Vec<Vec<u8>> = (0..5).map(|i| vec![b'a' + i as u8; 1000 + i]).collect();
        let refs: Vec<&[u8]> = chunks.iter().map(|c| c.as_slice()).collect();
        let bytes = compress_chunks(&refs, opts);

        let mut cursor = Cursor::new(&bytes);
        let header = Header::read(&mut cursor, &mut DigestSet::new()).unwrap();
        let mut lens = Vec::new();
        while let Some(block) = BlockHeader::read(&mut cursor, header.flags).unwrap() {
            lens.push(block.dst_len as usize);
            cursor.set_position(cursor.position() + block.src_len as u64);
        }
        assert_eq!(lens, vec![1000, 1001, 1002, 1003, 1004]);
        assert_eq!(read_all(&bytes), chunks.concat());
    }

    #[test]
    fn small_reads_drain_buffer() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let bytes = compress_chunks(&[&data[..4000], &data[4000..]], WriterOptions::default());
        let mut reader = LzopReader::new(&bytes[..]);
        let mut out = Vec::new();
        let mut buf = [0u8; 7];
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, data);
        assert_eq!(reader.read(&mut buf).unwrap(), 0, "reads after the sentinel keep returning 0");
    }

    #[test]
    fn stored_codec_produces_verbatim_blocks() {
        let opts = WriterOptions { flags: F_ADLER32_D | F_ADLER32_C, ..WriterOptions::default() };
        let mut w = LzopWriter::with_codec(Vec::new(), opts, Box::new(StoredCodec)).unwrap();
        w.write_all(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
        let bytes = w.finish().unwrap();

        let mut cursor = Cursor::new(&bytes);
        let header = Header::read(&mut cursor, &mut DigestSet::new()).unwrap();
        let block = BlockHeader::read(&mut cursor, header.flags).unwrap().unwrap();
        assert!(block.is_verbatim());
        assert_eq!(block.encoded_len(), 12);
        assert_eq!(read_all(&bytes), b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    }

    #[test]
    fn header_errors_surface_on_first_read_and_stick() {
        let mut reader = LzopReader::new(&b"not an lzop stream at all"[..]);
        let mut buf = [0u8; 16];
        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(matches!(reader.header(), Err(LzopError::StreamFailed)));
        assert!(reader.close().is_err());
    }

    #[test]
    fn truncated_stream_is_an_io_error() {
        let bytes = compress_chunks(&[b"some data to truncate"], WriterOptions::default());
        let cut = &bytes[..bytes.len() - 6];
        let err = LzopReader::new(cut).read_to_end(&mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    /// Accepts `budget` bytes, then fails every write.
    struct LimitedSink {
        buf:    Vec<u8>,
        budget: usize,
    }

    impl LimitedSink {
        fn new(budget: usize) -> Self {
            Self { buf: Vec::new(), budget }
        }
    }

    impl Write for LimitedSink {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "sink full"));
            }
            let n = data.len().min(self.budget);
            self.buf.extend_from_slice(&data[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_error_during_header_sticks() {
        let mut w = LzopWriter::new(LimitedSink::new(12));
        assert!(matches!(w.write_block(b"data"), Err(LzopError::Io(_))));

        w.writer.budget = usize::MAX;
        assert!(matches!(w.write_block(b"data"), Err(LzopError::StreamFailed)));
        assert!(matches!(w.set_name("late.txt"), Err(LzopError::StreamFailed)));
        assert!(matches!(w.close(), Err(LzopError::StreamFailed)));
        // No second header was started after the partial one.
        assert_eq!(w.writer.buf.len(), 12);
    }

    #[test]
    fn sink_error_during_block_sticks() {
        let mut w = LzopWriter::new(LimitedSink::new(50));
        assert!(matches!(w.write_block(&[b'q'; 4000]), Err(LzopError::Io(_))));

        w.writer.budget = usize::MAX;
        assert!(matches!(w.write_block(b"more"), Err(LzopError::StreamFailed)));
        let err = w.write(b"more").unwrap_err();
        let inner = err.into_inner().unwrap().downcast::<LzopError>().unwrap();
        assert!(matches!(*inner, LzopError::StreamFailed));
        assert!(matches!(w.close(), Err(LzopError::StreamFailed)));
        assert!(w.finish().is_err());
    }

    #[test]
    fn sink_error_on_sentinel_sticks() {
        let mut w = LzopWriter::new(LimitedSink::new(usize::MAX));
        w.write_all(b"payload").unwrap();
        w.writer.budget = 2;
        assert!(matches!(w.close(), Err(LzopError::Io(_))));
        assert!(matches!(w.close(), Err(LzopError::StreamFailed)));
    }

    #[test]
    fn reset_clears_failure() {
        let mut w = LzopWriter::new(LimitedSink::new(0));
        assert!(w.write_block(b"x").is_err());
        w.reset(LimitedSink::new(usize::MAX));
        w.write_all(b"fresh").unwrap();
        let sink = w.finish().unwrap();
        assert_eq!(read_all(&sink.buf), b"fresh");
    }

    #[test]
    fn engine_failure_surfaces_as_codec_error() {
        let header = Header::for_writer(Tier::Speed, LZO_LIBRARY_VERSION, 0, "", fixed_mtime()).unwrap();
        let mut bytes = Vec::new();
        header.write(&mut bytes, &mut DigestSet::new()).unwrap();
        let block = BlockHeader {
            dst_len:      100,
            src_len:      10,
            decompressed: Checksums::default(),
            compressed:   Checksums::default(),
        };
        block.write(&mut bytes).unwrap();
        bytes.extend_from_slice(&[0xFF; 10]);
        bytes.extend_from_slice(&0u32.to_be_bytes());

        let mut reader = LzopReader::new(&bytes[..]);
        let err = reader.read_to_end(&mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let inner = err.into_inner().unwrap().downcast::<LzopError>().unwrap();
        assert!(matches!(*inner, LzopError::Codec(CodecError::CorruptData(_))));
        assert!(reader.close().is_err());
    }
}
