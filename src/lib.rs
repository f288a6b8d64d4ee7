pub mod error;
pub mod digest;
pub mod codec;
pub mod header;
pub mod block;
pub mod io_stream;
pub mod index;
pub mod archive;

pub use error::LzopError;
pub use codec::{Codec, Tier, Lzo1xCodec};
pub use header::Header;
pub use block::{BlockHeader, encode_block, decode_block};
pub use io_stream::{LzopReader, LzopWriter, WriterOptions};
pub use index::{BlockIndex, Indexer, create_index};
