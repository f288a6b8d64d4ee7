use clap::{Parser, Subcommand};
use lzopio::archive::{compress_file, compress_file_to, decompress_file, CompressOptions};
use lzopio::codec::{method_name, BEST_COMPRESSION};
use lzopio::header::{F_ADLER32_C, F_CRC32_C, F_H_CRC32};
use lzopio::{create_index, LzopReader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lzop", about = "Compress, decompress and index lzop streams", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into <file>.lzo
    Compress {
        input: PathBuf,
        /// Compression level; 9 selects the best tier, anything lower the speed tier
        #[arg(short, long, default_value = "3")]
        level: i32,
        /// Raw bytes per block in KiB
        #[arg(short, long, default_value = "256")]
        block_size: usize,
        /// Also checksum the compressed side of every block
        #[arg(long)]
        compressed_checksums: bool,
        /// Protect the header with CRC-32 instead of Adler-32
        #[arg(long)]
        header_crc32: bool,
        /// Output path (default: <input>.lzo)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decompress a stream, restoring the name stored in its header
    Decompress {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Write <file>.index with the offset of every block
    Index {
        input: PathBuf,
    },
    /// Show header metadata
    Info {
        input: PathBuf,
    },
}

fn kib_to_bytes(kib: usize) -> Result<usize, String> {
    kib.checked_mul(1024).ok_or_else(|| format!("block size of {kib} KiB is too large"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match Cli::parse().command {

        // ── Compress ─────────────────────────────────────────────────────────
        Commands::Compress { input, level, block_size, compressed_checksums, header_crc32, output } => {
            let block_size = kib_to_bytes(block_size)?;
            let mut opts = CompressOptions {
                level: level.clamp(-1, BEST_COMPRESSION),
                block_size,
                ..CompressOptions::default()
            };
            if compressed_checksums { opts.flags |= F_ADLER32_C | F_CRC32_C; }
            if header_crc32         { opts.flags |= F_H_CRC32; }

            let out = match output {
                Some(out) => { compress_file_to(&input, &out, &opts)?; out }
                None      => compress_file(&input, &opts)?,
            };
            println!("Created: {}", out.display());
        }

        // ── Decompress ───────────────────────────────────────────────────────
        Commands::Decompress { input, output_dir } => {
            let out = decompress_file(&input, &output_dir)?;
            println!("Restored: {}", out.display());
        }

        // ── Index ────────────────────────────────────────────────────────────
        Commands::Index { input } => {
            let index = create_index(&input)?;
            println!("Indexed {} block(s) in {}", index.len(), input.display());
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let mut reader = LzopReader::open(std::fs::File::open(&input)?)?;
            let h = reader.header()?;
            println!("── lzop stream ──────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  Version        {:#06x}", h.version);
            println!("  Library        {:#06x}", h.lib_version);
            if let Some(v) = h.extract_version {
                println!("  Extract        {:#06x}", v);
            }
            println!("  Method         {} ({})", h.method, method_name(h.method));
            if let Some(l) = h.level {
                println!("  Level          {}", l);
            }
            println!("  Flags          {:#010x}", h.flags);
            println!("  Mode           {:o}", h.mode());
            println!("  Modified       {}", h.mtime().to_rfc3339());
            println!("  Name           {}", h.name());
        }
    }

    Ok(())
}
