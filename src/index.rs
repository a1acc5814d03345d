//! Flat exhaustive vector index.
//!
//! Stores embedding vectors in one contiguous buffer and answers
//! k-nearest-neighbor queries by scanning every stored vector with
//! squared Euclidean distance. At the expected corpus scale (tens of
//! thousands of chunks) an exhaustive scan outperforms the bookkeeping
//! of an approximate structure, so none is used.
//!
//! The index is immutable once built. Any change to the document set
//! goes through a full rebuild that produces a new index value.

use crate::error::{Error, Result};

/// One embedding vector paired with its provenance tag (the source
/// document's name).
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub vector: Vec<f32>,
    pub tag: String,
}

/// A single nearest-neighbor match.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Source document name of the matched chunk.
    pub tag: String,
    /// Squared L2 distance to the query vector. Smaller is closer.
    pub distance: f32,
}

/// Flat L2 index over fixed-dimension `f32` vectors.
#[derive(Debug)]
pub struct VectorIndex {
    dims: usize,
    /// Row-major storage: vector `i` occupies `[i * dims, (i + 1) * dims)`.
    data: Vec<f32>,
    tags: Vec<String>,
}

impl VectorIndex {
    /// Build an index from `(vector, tag)` records.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyCorpus`] when `records` is empty.
    /// - [`Error::DimensionMismatch`] when vectors disagree on dimension.
    pub fn build(records: Vec<VectorRecord>) -> Result<Self> {
        let dims = match records.first() {
            Some(first) => first.vector.len(),
            None => return Err(Error::EmptyCorpus),
        };

        let mut data = Vec::with_capacity(records.len() * dims);
        let mut tags = Vec::with_capacity(records.len());
        for record in records {
            if record.vector.len() != dims {
                return Err(Error::DimensionMismatch {
                    expected: dims,
                    actual: record.vector.len(),
                });
            }
            data.extend_from_slice(&record.vector);
            tags.push(record.tag);
        }

        Ok(Self { dims, data, tags })
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Vector dimensionality.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Return the `min(k, len)` nearest records to `query`, ordered by
    /// ascending squared L2 distance.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] when `query` has the wrong dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dims {
            return Err(Error::DimensionMismatch {
                expected: self.dims,
                actual: query.len(),
            });
        }

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dims)
            .zip(self.tags.iter())
            .map(|(row, tag)| SearchHit {
                tag: tag.clone(),
                distance: squared_l2(query, row),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }
}

/// Squared Euclidean distance between two equal-length vectors.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(vector: Vec<f32>, tag: &str) -> VectorRecord {
        VectorRecord {
            vector,
            tag: tag.to_string(),
        }
    }

    #[test]
    fn test_build_empty_fails() {
        let err = VectorIndex::build(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus));
    }

    #[test]
    fn test_build_mismatched_dims_fails() {
        let records = vec![
            record(vec![1.0, 2.0, 3.0], "a"),
            record(vec![1.0, 2.0], "b"),
        ];
        let err = VectorIndex::build(records).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = VectorIndex::build(vec![
            record(vec![10.0, 0.0], "far"),
            record(vec![1.0, 0.0], "near"),
            record(vec![5.0, 0.0], "mid"),
        ])
        .unwrap();

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        let tags: Vec<&str> = hits.iter().map(|h| h.tag.as_str()).collect();
        assert_eq!(tags, vec!["near", "mid", "far"]);
        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_search_distance_is_squared_l2() {
        let index = VectorIndex::build(vec![record(vec![3.0, 4.0], "a")]).unwrap();
        let hits = index.search(&[0.0, 0.0], 1).unwrap();
        assert!((hits[0].distance - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_search_k_clamped_to_size() {
        let index = VectorIndex::build(vec![
            record(vec![1.0], "a"),
            record(vec![2.0], "b"),
            record(vec![3.0], "c"),
        ])
        .unwrap();

        let hits = index.search(&[0.0], 5).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_search_wrong_query_dims_fails() {
        let index = VectorIndex::build(vec![record(vec![1.0, 2.0], "a")]).unwrap();
        let err = index.search(&[1.0, 2.0, 3.0], 1).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn test_exact_match_has_zero_distance() {
        let index = VectorIndex::build(vec![
            record(vec![0.5, -0.5, 2.0], "target"),
            record(vec![9.0, 9.0, 9.0], "other"),
        ])
        .unwrap();

        let hits = index.search(&[0.5, -0.5, 2.0], 1).unwrap();
        assert_eq!(hits[0].tag, "target");
        assert!(hits[0].distance.abs() < 1e-6);
    }

    #[test]
    fn test_len_and_dims() {
        let index = VectorIndex::build(vec![
            record(vec![1.0, 0.0, 0.0, 0.0], "a"),
            record(vec![0.0, 1.0, 0.0, 0.0], "b"),
        ])
        .unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.dims(), 4);
        assert!(!index.is_empty());
    }
}
