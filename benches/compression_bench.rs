use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lzopio::codec::{Codec, Lzo1xCodec, Tier};
use lzopio::{Indexer, LzopReader, LzopWriter, WriterOptions};
use std::io::{Cursor, Read, Write};

fn sample(len: usize) -> Vec<u8> {
    let text = b"lorem ipsum dolor sit amet, consectetur adipiscing elit ";
    (0..len).map(|i| text[i % text.len()] ^ (i / 4096) as u8).collect()
}

fn pack(data: &[u8], block: usize, flags: u32) -> Vec<u8> {
    let opts = WriterOptions { flags, ..WriterOptions::default() };
    let mut w = LzopWriter::with_options(Vec::new(), opts).unwrap();
    for chunk in data.chunks(block) {
        w.write_all(chunk).unwrap();
    }
    w.finish().unwrap()
}

fn bench_codec(c: &mut Criterion) {
    let data = sample(1024 * 1024);
    let lzo = Lzo1xCodec;
    let packed = lzo.compress(&data, Tier::Speed).unwrap();

    c.bench_function("lzo1x_compress_1mb", |b| b.iter(|| lzo.compress(black_box(&data), Tier::Speed)));
    c.bench_function("lzo1x_decompress_1mb", |b| b.iter(|| lzo.decompress(black_box(&packed), data.len())));
}

fn bench_stream(c: &mut Criterion) {
    let data = sample(4 * 1024 * 1024);
    let default_flags = WriterOptions::default().flags;

    c.bench_function("write_4mb_256k_blocks", |b| {
        b.iter(|| pack(black_box(&data), 256 * 1024, default_flags))
    });

    c.bench_function("write_4mb_no_checksums", |b| {
        b.iter(|| pack(black_box(&data), 256 * 1024, 0))
    });

    let packed = pack(&data, 256 * 1024, default_flags);
    c.bench_function("read_4mb_256k_blocks", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(data.len());
            LzopReader::new(black_box(&packed[..])).read_to_end(&mut out).unwrap();
            out
        })
    });
}

fn bench_index(c: &mut Criterion) {
    let data = sample(4 * 1024 * 1024);
    let packed = pack(&data, 16 * 1024, WriterOptions::default().flags);

    c.bench_function("index_256_blocks", |b| {
        b.iter(|| Indexer::new(Cursor::new(black_box(&packed))).unwrap().run().unwrap())
    });
}

criterion_group!(benches, bench_codec, bench_stream, bench_index);
criterion_main!(benches);
