// src/ingest/chunk.rs

/// A planned chunk: a half-open row range within the materialized trip
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Plan the chunked load: `total_rows / chunksize + 1` consecutive ranges
/// of at most `chunksize` rows each.
///
/// The formula yields one trailing empty chunk whenever `total_rows`
/// divides evenly; the load loop skips empty chunks instead of adjusting
/// the count.
pub fn plan(total_rows: usize, chunksize: usize) -> Vec<Chunk> {
    assert!(chunksize > 0, "chunksize must be positive");
    let num_chunks = total_rows / chunksize + 1;
    (0..num_chunks)
        .map(|index| Chunk {
            index,
            start: index * chunksize,
            end: ((index + 1) * chunksize).min(total_rows),
        })
        .collect()
}
