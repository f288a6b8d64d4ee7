//! File-level helpers for compressing and restoring whole files.
//!
//! ```no_run
//! use lzopio::archive::{compress_file, decompress_file, CompressOptions};
//!
//! let packed = compress_file("notes.txt", &CompressOptions::default())?;
//! let restored = decompress_file(&packed, "restore/")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;

use crate::block::MAX_BLOCK_SIZE;
use crate::codec::DEFAULT_COMPRESSION;
use crate::error::{LzopError, Result};
use crate::io_stream::{LzopReader, LzopWriter, WriterOptions};

/// Default raw bytes per block: 256 KiB.
pub const DEFAULT_BLOCK_SIZE: usize = 256 * 1024;

pub const LZO_EXTENSION: &str = "lzo";

// ── CompressOptions ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CompressOptions {
    pub level:      i32,
    pub block_size: usize,
    /// Block checksum flags; see [`WriterOptions::flags`].
    pub flags:      u32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            level:      DEFAULT_COMPRESSION,
            block_size: DEFAULT_BLOCK_SIZE,
            flags:      WriterOptions::default().flags,
        }
    }
}

/// Compress `path` into `<path>.lzo`, returning the output path.
///
/// The header stores the input's base name and modification time.
pub fn compress_file<P: AsRef<Path>>(path: P, opts: &CompressOptions) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut out_name = path.as_os_str().to_owned();
    out_name.push(".");
    out_name.push(LZO_EXTENSION);
    let out = PathBuf::from(out_name);
    compress_file_to(path, &out, opts)?;
    Ok(out)
}

pub fn compress_file_to<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q, opts: &CompressOptions) -> Result<u64> {
    let input = input.as_ref();
    if opts.block_size == 0 || opts.block_size > MAX_BLOCK_SIZE {
        return Err(LzopError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("block size {} outside 1..={MAX_BLOCK_SIZE}", opts.block_size),
        )));
    }

    let src = File::open(input)?;
    let mtime = src.metadata()?.modified().ok().map(DateTime::<Utc>::from);
    let name = input.file_name().map(|n| n.to_string_lossy().into_owned());

    let options = WriterOptions { level: opts.level, name, mtime, flags: opts.flags };
    let mut writer = LzopWriter::with_options(BufWriter::new(File::create(output.as_ref())?), options)?;

    let mut src = BufReader::new(src);
    let mut buf = vec![0u8; opts.block_size];
    let mut total = 0u64;
    loop {
        let n = read_full(&mut src, &mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_block(&buf[..n])?;
        total += n as u64;
    }
    writer.finish()?;
    info!("compressed {} ({total} bytes) -> {}", input.display(), output.as_ref().display());
    Ok(total)
}

/// Decompress `path` into `dest`, creating it if necessary.
///
/// The output is named after the name stored in the header; streams without
/// one are named after the input with its `.lzo` suffix removed.
pub fn decompress_file<P: AsRef<Path>, Q: AsRef<Path>>(path: P, dest: Q) -> Result<PathBuf> {
    let path = path.as_ref();
    let dest = dest.as_ref();
    let mut reader = LzopReader::open(BufReader::new(File::open(path)?))?;

    let stored = reader.header()?.name().into_owned();
    // Only the final component is trusted; stored paths never escape `dest`.
    let file_name = Path::new(&stored)
        .file_name()
        .map(|n| n.to_os_string())
        .or_else(|| path.file_stem().map(|s| s.to_os_string()))
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "cannot derive an output name"))?;

    if !dest.exists() {
        fs::create_dir_all(dest)?;
    }
    let out = dest.join(file_name);
    let mut sink = BufWriter::new(File::create(&out)?);
    let n = io::copy(&mut reader, &mut sink)?;
    sink.flush()?;
    reader.close()?;
    info!("decompressed {} ({n} bytes) -> {}", path.display(), out.display());
    Ok(out)
}

/// Fill `buf` unless the source ends first.
fn read_full<R: Read>(src: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
