//! Exact nearest-neighbour index over embedding vectors
//!
//! Brute-force squared L2 over a contiguous row-major matrix. Results are
//! ordered by `(distance, position)` so ties always resolve to the earlier
//! insertion regardless of scan order. An approximate structure could replace
//! the scan behind the same `build`/`search`/`save`/`load` surface.
//!
//! # File format
//!
//! Little-endian throughout:
//! - magic `TLVX` (4 bytes), version `u32`, dimension `u32`, count `u64`
//! - fingerprint flag `u8`, followed by 32 bytes when the flag is 1
//! - `count * dimension` `f32` values

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::core::corpus::CorpusFingerprint;
use crate::error::{Result, SearchError};

const INDEX_MAGIC: &[u8; 4] = b"TLVX";
const MATRIX_MAGIC: &[u8; 4] = b"TLEM";
const FORMAT_VERSION: u32 = 1;
const BYTES_PER_F32: usize = 4;

/// One hit: index position and squared Euclidean distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    count: usize,
    data: Vec<f32>,
    fingerprint: Option<CorpusFingerprint>,
}

impl VectorIndex {
    /// Bulk-build from vectors in insertion order
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let Some(first) = vectors.first() else {
            return Ok(Self::empty());
        };
        let dimension = first.len();
        if dimension == 0 {
            return Err(SearchError::InvalidArgument(
                "vectors must have at least one component".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(dimension * vectors.len());
        for (position, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(SearchError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(SearchError::InvalidArgument(format!(
                    "vector {position} contains a non-finite component"
                )));
            }
            data.extend_from_slice(vector);
        }

        debug!(count = vectors.len(), dimension, "Built vector index");

        Ok(Self {
            dimension,
            count: vectors.len(),
            data,
            fingerprint: None,
        })
    }

    pub fn empty() -> Self {
        Self {
            dimension: 0,
            count: 0,
            data: Vec::new(),
            fingerprint: None,
        }
    }

    /// Stamp the fingerprint of the corpus this index was built from
    pub fn with_fingerprint(mut self, fingerprint: CorpusFingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    pub fn fingerprint(&self) -> Option<&CorpusFingerprint> {
        self.fingerprint.as_ref()
    }

    pub fn size(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Vector dimension; 0 for an empty index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.count {
            return None;
        }
        let start = position * self.dimension;
        Some(&self.data[start..start + self.dimension])
    }

    /// The `k` nearest vectors to `query`, ascending by distance then position
    ///
    /// Returns every vector when the index holds fewer than `k`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Err(SearchError::InvalidArgument(
                "k must be a positive integer".to_string(),
            ));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(SearchError::InvalidArgument(
                "query vector contains a non-finite component".to_string(),
            ));
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| Neighbor {
                position,
                distance: squared_l2(query, row),
            })
            .collect();

        let k = k.min(neighbors.len());
        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, compare_neighbors);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(compare_neighbors);

        Ok(neighbors)
    }

    /// Write the index to `path` via a temporary file and rename
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut header = Vec::with_capacity(4 + 4 + 4 + 8 + 1 + 32);
        header.extend_from_slice(INDEX_MAGIC);
        header.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        header.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        header.extend_from_slice(&(self.count as u64).to_le_bytes());
        match &self.fingerprint {
            Some(fingerprint) => {
                header.push(1);
                header.extend_from_slice(&fingerprint.0);
            }
            None => header.push(0),
        }

        write_atomically(path, &header, &self.data)?;
        info!(path = %path.display(), vectors = self.count, dimension = self.dimension, "Saved vector index");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;
        let index = Self::from_bytes(&bytes)?;
        info!(path = %path.display(), vectors = index.count, dimension = index.dimension, "Loaded vector index");
        Ok(index)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(bytes);

        if cursor.take(4)? != INDEX_MAGIC {
            return Err(corrupt("bad magic bytes"));
        }
        let version = cursor.read_u32()?;
        if version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format version {version}")));
        }
        let dimension = cursor.read_u32()? as usize;
        let count = usize::try_from(cursor.read_u64()?)
            .map_err(|_| corrupt("vector count does not fit in memory"))?;

        let fingerprint = match cursor.take(1)?[0] {
            0 => None,
            1 => {
                let mut digest = [0u8; 32];
                digest.copy_from_slice(cursor.take(32)?);
                Some(CorpusFingerprint(digest))
            }
            flag => return Err(corrupt(format!("unknown fingerprint flag {flag}"))),
        };

        let data = read_matrix(cursor.rest(), dimension, count)?;

        Ok(Self {
            dimension,
            count,
            data,
            fingerprint,
        })
    }
}

/// Persist the raw embedding matrix of `index` alongside it
///
/// Same layout as the index file minus the fingerprint block, so the matrix
/// can be audited or fed to another index without re-embedding.
pub fn save_embedding_matrix(path: &Path, index: &VectorIndex) -> Result<()> {
    let mut header = Vec::with_capacity(4 + 4 + 4 + 8);
    header.extend_from_slice(MATRIX_MAGIC);
    header.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    header.extend_from_slice(&(index.dimension as u32).to_le_bytes());
    header.extend_from_slice(&(index.count as u64).to_le_bytes());

    write_atomically(path, &header, &index.data)
}

pub fn load_embedding_matrix(path: &Path) -> Result<Vec<Vec<f32>>> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    let mut cursor = ByteCursor::new(&bytes);

    if cursor.take(4)? != MATRIX_MAGIC {
        return Err(corrupt("bad magic bytes"));
    }
    let version = cursor.read_u32()?;
    if version != FORMAT_VERSION {
        return Err(corrupt(format!("unsupported format version {version}")));
    }
    let dimension = cursor.read_u32()? as usize;
    let count = usize::try_from(cursor.read_u64()?)
        .map_err(|_| corrupt("vector count does not fit in memory"))?;

    let data = read_matrix(cursor.rest(), dimension, count)?;
    if dimension == 0 {
        return Ok(Vec::new());
    }
    Ok(data.chunks_exact(dimension).map(<[f32]>::to_vec).collect())
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then(a.position.cmp(&b.position))
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn corrupt(message: impl Into<String>) -> SearchError {
    SearchError::CorruptIndex(message.into())
}

fn write_atomically(path: &Path, header: &[u8], data: &[f32]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = temp_path_for(path);
    let written = write_payload(&temp_path, header, data)
        .and_then(|()| std::fs::rename(&temp_path, path).map_err(SearchError::from));
    if written.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    written
}

fn write_payload(temp_path: &Path, header: &[u8], data: &[f32]) -> Result<()> {
    let file = File::create(temp_path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(header)?;
    for &val in data {
        writer.write_all(&val.to_le_bytes())?;
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// Sibling temp file, unique per write so overlapping writers never share one
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    path.with_file_name(name)
}

fn read_matrix(payload: &[u8], dimension: usize, count: usize) -> Result<Vec<f32>> {
    if count > 0 && dimension == 0 {
        return Err(corrupt(format!("{count} vectors declared with dimension 0")));
    }
    if count == 0 && dimension != 0 {
        return Err(corrupt(format!("empty index declares dimension {dimension}")));
    }

    let expected = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(BYTES_PER_F32))
        .ok_or_else(|| corrupt("declared size overflows"))?;
    if payload.len() != expected {
        return Err(corrupt(format!(
            "expected {expected} payload bytes for {count}x{dimension}, found {}",
            payload.len()
        )));
    }

    let data: Vec<f32> = payload
        .chunks_exact(BYTES_PER_F32)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    if data.iter().any(|v| !v.is_finite()) {
        return Err(corrupt("payload contains non-finite values"));
    }
    Ok(data)
}

struct ByteCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.offset + len;
        let slice = self
            .bytes
            .get(self.offset..end)
            .ok_or_else(|| corrupt("unexpected end of header"))?;
        self.offset = end;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }
}
