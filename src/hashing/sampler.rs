//! Content sampler: reads `k` evenly-spaced 64 KiB windows of a file and feeds
//! them, in offset order, into a fresh XXH3-64 streaming hash.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use xxhash_rust::xxh3::Xxh3;

use super::ZERO_HASH;

/// Chunk size used by the content sampler, in bytes.
pub const CHUNK_SIZE: u64 = 65_536;
const MIB: f64 = 1024.0 * 1024.0;
const MIN_CHUNKS: i64 = 3;
const MAX_CHUNKS: i64 = 100;

/// Number of chunks the sampler reads for a file of `size` bytes.
///
/// `1` when `size <= CHUNK_SIZE` (whole file read as a single chunk);
/// otherwise `clamp(floor(log2(size / 2^20)) * 3, 3, 100)`.
pub fn content_chunk_count(size: u64) -> usize {
    if size <= CHUNK_SIZE {
        return 1;
    }
    let mib = size as f64 / MIB;
    let k = (mib.log2().floor() as i64) * 3;
    k.clamp(MIN_CHUNKS, MAX_CHUNKS) as usize
}

/// Sample `path` (a file of `size` bytes) and return its 8-byte content
/// fingerprint. Any read failure yields the all-zero sentinel.
pub fn sample_file(path: &Path, size: u64) -> [u8; 8] {
    sample_file_inner(path, size).unwrap_or(ZERO_HASH)
}

fn sample_file_inner(path: &Path, size: u64) -> io::Result<[u8; 8]> {
    let mut file = File::open(path)?;
    let mut hasher = Xxh3::new();

    if size <= CHUNK_SIZE {
        let mut buf = vec![0u8; size as usize];
        file.read_exact(&mut buf)?;
        hasher.update(&buf);
    } else {
        let k = content_chunk_count(size) as u64;
        let stride = size / k;
        let mut buf = Vec::with_capacity(CHUNK_SIZE as usize);
        for i in 0..k {
            let offset = std::cmp::min(i * stride, size - CHUNK_SIZE);
            let take = std::cmp::min(CHUNK_SIZE, size - offset) as usize;
            file.seek(SeekFrom::Start(offset))?;
            buf.resize(take, 0);
            file.read_exact(&mut buf)?;
            hasher.update(&buf);
        }
    }

    Ok(hasher.digest().to_be_bytes())
}
