//! Comment density over fixed-width time buckets and the busiest buckets.

use serde::Serialize;

use crate::error::{Error, Result};

/// Upper bound on the histogram length; 10 s buckets cover about 115 days.
pub const MAX_BUCKETS: usize = 1_000_000;

/// One of the busiest buckets, `[start, end)` seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Peak {
    pub rank: usize,
    pub bucket: usize,
    pub start: u64,
    pub end: u64,
    pub count: usize,
}

impl Peak {
    pub fn describe(&self) -> String {
        format!(
            "Top {}: {} comments between {}s and {}s.",
            self.rank, self.count, self.start, self.end
        )
    }
}

/// Per-bucket counts from 0 up to and including the largest timestamp.
/// Bucket `i` covers `[i * width, (i + 1) * width)`. Fails when the largest
/// timestamp would need more than [`MAX_BUCKETS`] buckets.
///
/// # Example
/// ```
/// use danmaku_analysis::bucket_counts;
/// let counts = bucket_counts(&[0.0, 0.0, 5.0, 12.0, 12.0, 12.0, 25.0], 10).unwrap();
/// assert_eq!(counts, vec![3, 3, 1]);
/// ```
pub fn bucket_counts(timestamps: &[f64], width: u64) -> Result<Vec<usize>> {
    let width_secs = width.max(1);
    let width = width_secs as f64;
    let max = timestamps
        .iter()
        .copied()
        .filter(|t| t.is_finite() && *t >= 0.0)
        .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |m| m.max(t))));
    let Some(max) = max else {
        return Ok(Vec::new());
    };

    let last = (max / width).floor();
    if last >= MAX_BUCKETS as f64 {
        return Err(Error::TimelineTooLong {
            max,
            width: width_secs,
            limit: MAX_BUCKETS,
        });
    }
    let mut counts = vec![0usize; last as usize + 1];
    for t in timestamps.iter().filter(|t| t.is_finite() && **t >= 0.0) {
        counts[(t / width) as usize] += 1;
    }
    Ok(counts)
}

/// The `k` busiest buckets: descending count, ties by ascending bucket index.
pub fn top_buckets(counts: &[usize], width: u64, k: usize) -> Vec<Peak> {
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| counts[b].cmp(&counts[a]).then(a.cmp(&b)));
    order
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(i, bucket)| Peak {
            rank: i + 1,
            bucket,
            start: bucket as u64 * width,
            end: (bucket as u64 + 1) * width,
            count: counts[bucket],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_histogram_and_peaks() {
        let counts = bucket_counts(&[0.0, 0.0, 5.0, 12.0, 12.0, 12.0, 25.0], 10).unwrap();
        assert_eq!(counts, vec![3, 3, 1]);

        let peaks = top_buckets(&counts, 10, 3);
        let summary: Vec<(usize, u64, u64, usize)> = peaks
            .iter()
            .map(|p| (p.rank, p.start, p.end, p.count))
            .collect();
        assert_eq!(summary, vec![(1, 0, 10, 3), (2, 10, 20, 3), (3, 20, 30, 1)]);
    }

    #[test]
    fn max_timestamp_on_a_boundary_gets_its_own_bucket() {
        assert_eq!(bucket_counts(&[0.0, 20.0], 10).unwrap(), vec![1, 0, 1]);
        assert_eq!(bucket_counts(&[0.0], 10).unwrap(), vec![1]);
    }

    #[test]
    fn empty_input_has_no_buckets_or_peaks() {
        let counts = bucket_counts(&[], 10).unwrap();
        assert!(counts.is_empty());
        assert!(top_buckets(&counts, 10, 3).is_empty());
    }

    #[test]
    fn huge_timestamp_is_an_error_not_an_allocation() {
        let err = bucket_counts(&[1.0, 1e20], 10).unwrap_err();
        assert!(matches!(err, Error::TimelineTooLong { width: 10, .. }));
        assert!(bucket_counts(&[1e11], 10).is_err());

        let last_allowed = (MAX_BUCKETS - 1) as f64 * 10.0;
        assert_eq!(bucket_counts(&[last_allowed], 10).unwrap().len(), MAX_BUCKETS);
        assert!(bucket_counts(&[last_allowed + 10.0], 10).is_err());
    }

    #[test]
    fn fewer_buckets_than_requested_peaks() {
        let peaks = top_buckets(&[4], 10, 3);
        assert_eq!(peaks.len(), 1);
        assert_eq!(
            peaks[0].describe(),
            "Top 1: 4 comments between 0s and 10s."
        );
    }

    #[test]
    fn ties_resolved_by_ascending_index() {
        let peaks = top_buckets(&[1, 5, 2, 5, 5], 10, 3);
        let buckets: Vec<usize> = peaks.iter().map(|p| p.bucket).collect();
        assert_eq!(buckets, vec![1, 3, 4]);
    }
}
