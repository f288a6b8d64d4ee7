//! Block-offset index for random access into an lzop stream.
//!
//! The [`Indexer`] walks the block sequence of a seekable source without
//! decompressing anything: for each block it records where the block starts,
//! reads the length and checksum fields to stay aligned, and then seeks past
//! the payload.  This is a separate traversal from [`crate::LzopReader`] so
//! building an index never pays for the inverse transform.
//!
//! # Artifact format
//! A flat run of signed 64-bit big-endian offsets, one per non-sentinel
//! block, in stream order.  No header, trailer or length prefix.  By
//! convention the file sits next to the stream as `<stream>.index`.

use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info};

use crate::block::BlockHeader;
use crate::digest::DigestSet;
use crate::error::{LzopError, Result};
use crate::header::Header;

pub const INDEX_EXTENSION: &str = "index";

// ── BlockIndex ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockIndex {
    offsets: Vec<i64>,
}

impl BlockIndex {
    pub fn new(offsets: Vec<i64>) -> Self {
        Self { offsets }
    }

    pub fn offsets(&self) -> &[i64] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for &offset in &self.offsets {
            writer.write_i64::<BigEndian>(offset)?;
        }
        writer.flush()
    }

    /// Read an index artifact to its end.
    ///
    /// A trailing fragment shorter than eight bytes is `InvalidData`.
    pub fn read_from<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        if raw.len() % 8 != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("index length {} is not a multiple of 8", raw.len()),
            ));
        }
        let mut cursor = &raw[..];
        let mut offsets = Vec::with_capacity(raw.len() / 8);
        while !cursor.is_empty() {
            offsets.push(cursor.read_i64::<BigEndian>()?);
        }
        Ok(Self { offsets })
    }
}

/// `<path>.index`
pub fn index_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut s = path.as_ref().as_os_str().to_owned();
    s.push(".");
    s.push(INDEX_EXTENSION);
    PathBuf::from(s)
}

// ── Indexer ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexerState {
    Walking,
    Finished,
    Failed,
}

pub struct Indexer<R: Read + Seek> {
    reader:  R,
    header:  Header,
    offsets: Vec<i64>,
    state:   IndexerState,
}

impl<R: Read + Seek> Indexer<R> {
    /// Parse the header; the reader is left at the first block.
    pub fn new(mut reader: R) -> Result<Self> {
        let header = Header::read(&mut reader, &mut DigestSet::new())?;
        Ok(Self {
            reader,
            header,
            offsets: Vec::new(),
            state:   IndexerState::Walking,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// True once the sentinel has been reached.
    pub fn is_finished(&self) -> bool {
        self.state == IndexerState::Finished
    }

    pub fn offsets(&self) -> &[i64] {
        &self.offsets
    }

    /// Step over one block.  Returns its start offset, or `None` at the
    /// sentinel.
    pub fn next_block(&mut self) -> Result<Option<i64>> {
        match self.state {
            IndexerState::Finished => return Ok(None),
            IndexerState::Failed   => return Err(LzopError::StreamFailed),
            IndexerState::Walking  => {}
        }
        match self.step() {
            Ok(Some(offset)) => {
                self.offsets.push(offset);
                Ok(Some(offset))
            }
            Ok(None) => {
                self.state = IndexerState::Finished;
                Ok(None)
            }
            Err(e) => {
                self.state = IndexerState::Failed;
                Err(e)
            }
        }
    }

    fn step(&mut self) -> Result<Option<i64>> {
        let start = self.reader.stream_position()?;
        let Some(block) = BlockHeader::read(&mut self.reader, self.header.flags)? else {
            return Ok(None);
        };
        self.reader.seek(SeekFrom::Current(block.src_len as i64))?;
        Ok(Some(start as i64))
    }

    /// Walk to the sentinel and return the collected offsets.
    pub fn run(mut self) -> Result<BlockIndex> {
        while self.next_block()?.is_some() {}
        debug!("indexed {} blocks", self.offsets.len());
        Ok(BlockIndex::new(self.offsets))
    }

    /// Succeeds unless the walk hit an error.
    pub fn close(self) -> Result<R> {
        match self.state {
            IndexerState::Failed => Err(LzopError::StreamFailed),
            _                    => Ok(self.reader),
        }
    }
}

/// Index the stream at `path` and write `<path>.index`.
///
/// The artifact is only created once the whole stream has been walked
/// successfully.  The file is walked unbuffered: every payload is skipped
/// with a seek, which would discard a read buffer on each block.
pub fn create_index<P: AsRef<Path>>(path: P) -> Result<BlockIndex> {
    let path = path.as_ref();
    let index = Indexer::new(File::open(path)?)?.run()?;

    let out = index_path(path);
    index.write_to(BufWriter::new(File::create(&out)?))?;
    info!("wrote {} offsets to {}", index.len(), out.display());
    Ok(index)
}
