use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::Hash;

/// A half-open interval `[start, end)` of the reachability label space
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl From<Interval> for (u64, u64) {
    fn from(val: Interval) -> Self {
        (val.start, val.end)
    }
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Interval { start, end }
    }

    /// An empty interval positioned at `start`
    pub fn empty_at(start: u64) -> Self {
        Self::new(start, start)
    }

    /// Returns the maximally allowed interval. Label 0 is never handed out.
    pub fn maximal() -> Self {
        Self::new(1, u64::MAX)
    }

    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn increase(&self, offset: u64) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }

    pub fn decrease(&self, offset: u64) -> Self {
        Self::new(self.start - offset, self.end - offset)
    }

    pub fn increase_start(&self, offset: u64) -> Self {
        Self::new(self.start + offset, self.end)
    }

    pub fn decrease_start(&self, offset: u64) -> Self {
        Self::new(self.start - offset, self.end)
    }

    pub fn increase_end(&self, offset: u64) -> Self {
        Self::new(self.start, self.end + offset)
    }

    pub fn decrease_end(&self, offset: u64) -> Self {
        Self::new(self.start, self.end - offset)
    }

    /// The sub-range from which children are allocated: the last slot stays with the owner,
    /// so an owner strictly contains all of its descendants
    pub fn children_capacity(&self) -> Self {
        if self.is_empty() {
            *self
        } else {
            self.decrease_end(1)
        }
    }

    /// Splits this interval to two parts such that their
    /// union is equal to the original interval and the first (left) part
    /// contains the larger half in case the interval size is odd
    pub fn split_half(&self) -> (Self, Self) {
        let left_size = self.size().div_ceil(2);
        (Self::new(self.start, self.start + left_size), Self::new(self.start + left_size, self.end))
    }

    /// Splits this interval to exactly |sizes| parts where
    /// |part_i| = sizes[i]. This method expects sum(sizes) to be exactly
    /// equal to the interval's size.
    pub fn split_exact(&self, sizes: &[u64]) -> Vec<Self> {
        debug_assert_eq!(sizes.iter().sum::<u64>(), self.size(), "sum of sizes must be equal to the interval's size");
        let mut start = self.start;
        sizes
            .iter()
            .map(|size| {
                let interval = Self::new(start, start + size);
                start += size;
                interval
            })
            .collect()
    }

    /// Splits this interval to |sizes| parts
    /// by the allocation rule described below. This method expects sum(sizes)
    /// to be smaller or equal to the interval's size. Every part_i is
    /// allocated at least sizes[i] capacity. The remaining budget is
    /// split by an exponentially biased rule described below.
    ///
    /// This rule follows the GHOSTDAG protocol behavior where the child
    /// with the largest subtree is expected to dominate the competition
    /// for new blocks and thus grow the most. However, we may need to
    /// add slack for non-largest subtrees in order to make CPU reindexing
    /// attacks unworthy.
    pub fn split_exponential(&self, sizes: &[u64]) -> Vec<Self> {
        let interval_size = self.size();
        let sizes_sum = sizes.iter().sum::<u64>();
        debug_assert!(interval_size >= sizes_sum, "interval's size must be greater than or equal to sum of sizes");
        if interval_size == sizes_sum || sizes.is_empty() {
            return self.split_exact(sizes);
        }

        // Add a fractional bias to every size in the provided sizes
        let mut remaining_bias = interval_size - sizes_sum;
        let total_bias = remaining_bias as f64;

        let mut biased_sizes = Vec::<u64>::with_capacity(sizes.len());
        let exp_fractions = exponential_fractions(sizes);
        for (i, fraction) in exp_fractions.iter().enumerate() {
            let bias: u64 = if i == exp_fractions.len() - 1 {
                remaining_bias
            } else {
                remaining_bias.min((total_bias * fraction).round() as u64)
            };
            biased_sizes.push(sizes[i] + bias);
            remaining_bias -= bias;
        }
        self.split_exact(biased_sizes.as_slice())
    }

    pub fn contains(&self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn strictly_contains(&self, other: Self) -> bool {
        self.start <= other.start && other.end < self.end
    }
}

/// Returns a fraction for each size in sizes
/// as follows:
///   fraction[i] = 2^size[i] / sum_j(2^size[j])
/// In the code below the above equation is divided by 2^max(size)
/// to avoid exploding numbers. Note that in 1 / 2^(max(size)-size[i])
/// we divide 1 by potentially a very large number, which will
/// result in loss of float precision. This is not a problem - all
/// numbers close to 0 bear effectively the same weight.
fn exponential_fractions(sizes: &[u64]) -> Vec<f64> {
    let max_size = sizes.iter().copied().max().unwrap_or_default();

    let mut fractions = sizes.iter().map(|s| 1f64 / 2f64.powf((max_size - s) as f64)).collect::<Vec<f64>>();

    let fractions_sum = fractions.iter().sum::<f64>();
    for item in &mut fractions {
        *item /= fractions_sum;
    }

    fractions
}

/// Per-block reachability record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityData {
    /// Interval in the label space, containing the intervals of all tree descendants
    pub interval: Interval,
    /// Tree parent; `None` only for the reachability root
    pub parent: Option<Hash>,
    /// Tree children in insertion order, hence in ascending interval order
    pub children: Vec<Hash>,
    /// Blocks merged by this block's future which are not in its tree subtree, ordered by interval
    pub future_covering_set: Vec<Hash>,
}

impl ReachabilityData {
    pub fn new(parent: Option<Hash>, interval: Interval) -> Self {
        Self { interval, parent, children: Vec::new(), future_covering_set: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_half() {
        for (input, expected_left, expected_right) in [
            (Interval::new(1, 101), Interval::new(1, 51), Interval::new(51, 101)),
            (Interval::new(2, 102), Interval::new(2, 52), Interval::new(52, 102)),
            (Interval::new(1, 100), Interval::new(1, 51), Interval::new(51, 100)),
            (Interval::new(1, 2), Interval::new(1, 2), Interval::new(2, 2)),
            (Interval::new(5, 5), Interval::new(5, 5), Interval::new(5, 5)),
        ] {
            let (left, right) = input.split_half();
            assert_eq!(left, expected_left, "input {input}");
            assert_eq!(right, expected_right, "input {input}");
            assert_eq!(left.size() + right.size(), input.size());
        }
    }

    #[test]
    fn test_split_exact() {
        let sizes = vec![5, 10, 15, 20];
        let intervals = Interval::new(1, 51).split_exact(sizes.as_slice());
        assert_eq!(intervals, vec![Interval::new(1, 6), Interval::new(6, 16), Interval::new(16, 31), Interval::new(31, 51)]);
    }

    #[test]
    fn test_exponential_fractions() {
        let fractions = exponential_fractions(&[2, 4, 8, 16]);
        let sum: f64 = fractions.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(fractions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_split_exponential() {
        struct Test {
            interval: Interval,
            sizes: Vec<u64>,
            expected: Vec<Interval>,
        }

        let tests = [
            Test {
                interval: Interval::new(1, 101),
                sizes: vec![100u64],
                expected: vec![Interval::new(1, 101)],
            },
            Test {
                interval: Interval::new(1, 101),
                sizes: vec![50u64, 50],
                expected: vec![Interval::new(1, 51), Interval::new(51, 101)],
            },
            Test {
                interval: Interval::new(1, 101),
                sizes: vec![10u64, 20],
                expected: vec![Interval::new(1, 11), Interval::new(11, 101)],
            },
            Test {
                interval: Interval::new(1, 101),
                sizes: vec![25u64, 25],
                expected: vec![Interval::new(1, 51), Interval::new(51, 101)],
            },
            Test {
                interval: Interval::new(1, 101),
                sizes: vec![1u64, 1],
                expected: vec![Interval::new(1, 51), Interval::new(51, 101)],
            },
            Test {
                interval: Interval::new(1, 101),
                sizes: vec![33u64, 30, 30],
                expected: vec![Interval::new(1, 40), Interval::new(40, 71), Interval::new(71, 101)],
            },
        ];

        for test in &tests {
            let intervals = test.interval.split_exponential(test.sizes.as_slice());
            assert_eq!(intervals, test.expected, "sizes {:?}", test.sizes);
            for (interval, size) in intervals.iter().zip(test.sizes.iter()) {
                assert!(interval.size() >= *size);
            }
        }
    }

    #[test]
    fn test_contains() {
        let outer = Interval::new(1, 100);
        assert!(outer.contains(Interval::new(1, 100)));
        assert!(!outer.strictly_contains(Interval::new(1, 100)));
        assert!(outer.strictly_contains(Interval::new(1, 99)));
        assert!(outer.strictly_contains(outer.children_capacity()));
        assert!(!outer.contains(Interval::new(50, 101)));
        assert!(!Interval::new(1, 10).contains(Interval::new(10, 20)));
    }
}
