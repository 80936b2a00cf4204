//! Temporal segment sampling.
//!
//! Given `n` candidate frame positions and a `(num_segments, segment_size)`
//! target, the sampler partitions the positions into contiguous groups and
//! draws a fixed number from each: uniformly at random for training, at
//! fixed intervals for evaluation. Draws within a group are sorted ascending
//! and groups are concatenated in order, so intra-segment temporal order is
//! preserved while training still sees inter-sample randomness.

use std::ops::Range;

use rand::Rng;

use crate::error::{CoreError, CoreResult};

/// A `(num_segments, segment_size)` sampling target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSampler {
    num_segments: usize,
    segment_size: usize,
}

impl SegmentSampler {
    pub fn new(num_segments: usize, segment_size: usize) -> CoreResult<Self> {
        if num_segments == 0 || segment_size == 0 {
            return Err(CoreError::Validation(format!(
                "segment parameters must be positive, got {num_segments} segments of size {segment_size}"
            )));
        }
        Ok(SegmentSampler {
            num_segments,
            segment_size,
        })
    }

    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    /// Total number of positions a draw produces when no group is empty.
    pub fn sample_len(&self) -> usize {
        self.num_segments * self.segment_size
    }

    /// Training draw: per group, `segment_size` distinct positions chosen
    /// uniformly; a group smaller than `segment_size` is drawn with
    /// replacement instead, duplicating frames rather than failing.
    pub fn sample_random<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<usize> {
        let mut selected = Vec::with_capacity(self.sample_len());
        for group in split_groups(n, self.num_segments) {
            if group.is_empty() {
                continue;
            }
            let len = group.end - group.start;
            let mut draws: Vec<usize> = if len >= self.segment_size {
                rand::seq::index::sample(rng, len, self.segment_size)
                    .into_iter()
                    .map(|offset| group.start + offset)
                    .collect()
            } else {
                (0..self.segment_size)
                    .map(|_| rng.gen_range(group.clone()))
                    .collect()
            };
            draws.sort_unstable();
            selected.extend(draws);
        }
        selected
    }

    /// Evaluation draw: `num_segments * segment_size` positions at evenly
    /// spaced intervals over `[0, n-1]`, rounded to the nearest index.
    /// Deterministic; duplicates appear when `n` is smaller than the target.
    pub fn sample_fixed(&self, n: usize) -> Vec<usize> {
        if n == 0 {
            return Vec::new();
        }
        linspace_indices(n - 1, self.sample_len())
    }
}

/// Partitions `[0, n)` into `k` contiguous groups: the first `n % k` groups
/// take one extra element. Groups may be empty when `n < k`.
fn split_groups(n: usize, k: usize) -> Vec<Range<usize>> {
    let base = n / k;
    let remainder = n % k;
    let mut groups = Vec::with_capacity(k);
    let mut start = 0;
    for i in 0..k {
        let len = if i < remainder { base + 1 } else { base };
        groups.push(start..start + len);
        start += len;
    }
    groups
}

/// `count` evenly spaced positions over `[0, stop]` inclusive.
fn linspace_indices(stop: usize, count: usize) -> Vec<usize> {
    if count == 1 {
        return vec![0];
    }
    let step = stop as f64 / (count - 1) as f64;
    (0..count)
        .map(|i| (i as f64 * step).round() as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn split_puts_remainder_in_leading_groups() {
        let groups = split_groups(10, 4);
        let lens: Vec<usize> = groups.iter().map(|g| g.end - g.start).collect();
        assert_eq!(lens, vec![3, 3, 2, 2]);
        assert_eq!(groups.last().unwrap().end, 10);
    }

    #[test]
    fn split_with_fewer_elements_than_groups_leaves_empties() {
        let groups = split_groups(2, 4);
        let lens: Vec<usize> = groups.iter().map(|g| g.end - g.start).collect();
        assert_eq!(lens, vec![1, 1, 0, 0]);
    }

    #[test]
    fn random_draw_returns_exact_count() {
        let sampler = SegmentSampler::new(4, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let sample = sampler.sample_random(100, &mut rng);
        assert_eq!(sample.len(), 12);
        assert!(sample.iter().all(|&i| i < 100));
    }

    #[test]
    fn random_draw_is_sorted_within_each_segment() {
        let sampler = SegmentSampler::new(4, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let sample = sampler.sample_random(100, &mut rng);
        for segment in sample.chunks(3) {
            assert!(segment.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn one_draw_per_quartile_is_strictly_increasing() {
        let sampler = SegmentSampler::new(4, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let sample = sampler.sample_random(100, &mut rng);
            assert_eq!(sample.len(), 4);
            assert!(sample[0] < 25);
            assert!((25..50).contains(&sample[1]));
            assert!((50..75).contains(&sample[2]));
            assert!((75..100).contains(&sample[3]));
            assert!(sample.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn short_group_duplicates_instead_of_failing() {
        let sampler = SegmentSampler::new(2, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        // Three positions over two groups: both groups are smaller than the
        // per-segment size, so every draw goes through the replacement path.
        let sample = sampler.sample_random(3, &mut rng);
        assert_eq!(sample.len(), 8);
        assert!(sample.iter().all(|&i| i < 3));
    }

    #[test]
    fn empty_population_yields_empty_sample() {
        let sampler = SegmentSampler::new(4, 2).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sampler.sample_random(0, &mut rng).is_empty());
        assert!(sampler.sample_fixed(0).is_empty());
    }

    #[test]
    fn fixed_draw_matches_linspace_example() {
        let sampler = SegmentSampler::new(4, 1).unwrap();
        assert_eq!(sampler.sample_fixed(100), vec![0, 33, 66, 99]);
    }

    #[test]
    fn fixed_draw_is_deterministic() {
        let sampler = SegmentSampler::new(3, 2).unwrap();
        assert_eq!(sampler.sample_fixed(47), sampler.sample_fixed(47));
    }

    #[test]
    fn fixed_draw_duplicates_when_population_is_short() {
        let sampler = SegmentSampler::new(2, 3).unwrap();
        let sample = sampler.sample_fixed(2);
        assert_eq!(sample.len(), 6);
        assert!(sample.iter().all(|&i| i < 2));
        assert!(sample.windows(2).any(|w| w[0] == w[1]));
    }

    #[test]
    fn zero_parameters_are_rejected() {
        assert!(SegmentSampler::new(0, 3).is_err());
        assert!(SegmentSampler::new(3, 0).is_err());
    }
}
