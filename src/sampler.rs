/// Fenwick (binary indexed) tree over non-negative integer weights.
///
/// Backs degree-proportional target selection during network growth: point
/// updates and prefix sums in O(log n), plus an O(log n) search for the
/// index covering a cumulative target without rescanning the array.
pub struct WeightedSampler {
    len: usize,
    tree: Vec<u64>,
}

/// Out-of-range indices and targets are programmer errors and fail fast;
/// there is no error surface for valid inputs.
///
/// # Example
/// ```
/// use epinet::sampler::WeightedSampler;
///
/// let mut sampler = WeightedSampler::new(4);
/// sampler.update(0, 2);
/// sampler.update(2, 3);
///
/// assert_eq!(sampler.total(), 5);
/// assert_eq!(sampler.query(2), 5);
/// assert_eq!(sampler.sample(1), 0);
/// assert_eq!(sampler.sample(2), 2);
/// ```
impl WeightedSampler {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            tree: vec![0; len + 1],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sum of all weights.
    pub fn total(&self) -> u64 {
        if self.len == 0 {
            0
        } else {
            self.query(self.len - 1)
        }
    }

    /// Adds `delta` to the weight at `index`.
    pub fn update(&mut self, index: usize, delta: u64) {
        assert!(index < self.len, "index {} out of range {}", index, self.len);
        let mut x = index + 1;
        while x <= self.len {
            self.tree[x] += delta;
            x += lowest_bit(x);
        }
    }

    /// Prefix sum of the weights in `[0, index]`.
    pub fn query(&self, index: usize) -> u64 {
        assert!(index < self.len, "index {} out of range {}", index, self.len);
        let mut sum = 0;
        let mut x = index + 1;
        while x > 0 {
            sum += self.tree[x];
            x -= lowest_bit(x);
        }
        sum
    }

    /// Smallest index whose prefix sum exceeds `target`.
    ///
    /// Descends the tree in power-of-two strides, each step consuming the part
    /// of `target` covered by the range it skips. Requires
    /// `target < self.total()`; zero-weight indices are never returned.
    pub fn sample(&self, mut target: u64) -> usize {
        assert!(
            target < self.total(),
            "target {} out of range {}",
            target,
            self.total()
        );
        let mut index = 0;
        let mut stride = 1 << (usize::BITS - 1 - self.len.leading_zeros());
        while stride > 0 {
            let probe = index + stride;
            if probe <= self.len && self.tree[probe] <= target {
                target -= self.tree[probe];
                index = probe;
            }
            stride >>= 1;
        }
        index
    }
}

fn lowest_bit(x: usize) -> usize {
    x & x.wrapping_neg()
}

#[cfg(test)]
mod test {
    use super::*;
    use pcg_rand::Pcg64;
    use rand::{Rng, SeedableRng};

    fn naive_sample(weights: &[u64], target: u64) -> usize {
        let mut sum = 0;
        for (index, &w) in weights.iter().enumerate() {
            sum += w;
            if sum > target {
                return index;
            }
        }
        panic!("target {} not covered", target);
    }

    #[test]
    fn prefix_sums_match_naive_scan() {
        let mut rng = Pcg64::seed_from_u64(7);
        let weights: Vec<u64> = (0..37).map(|_| rng.gen_range(0..5)).collect();

        let mut sampler = WeightedSampler::new(weights.len());
        for (index, &w) in weights.iter().enumerate() {
            sampler.update(index, w);
        }

        let mut prefix = 0;
        for (index, &w) in weights.iter().enumerate() {
            prefix += w;
            assert_eq!(sampler.query(index), prefix);
        }
        assert_eq!(sampler.total(), prefix);
    }

    #[test]
    fn sample_covers_every_target() {
        let mut rng = Pcg64::seed_from_u64(11);
        let weights: Vec<u64> = (0..61).map(|_| rng.gen_range(0..4)).collect();

        let mut sampler = WeightedSampler::new(weights.len());
        for (index, &w) in weights.iter().enumerate() {
            sampler.update(index, w);
        }

        for target in 0..sampler.total() {
            assert_eq!(sampler.sample(target), naive_sample(&weights, target));
        }
    }

    #[test]
    fn incremental_updates_accumulate() {
        let mut sampler = WeightedSampler::new(8);
        assert_eq!(sampler.len(), 8);
        assert!(!sampler.is_empty());
        sampler.update(3, 2);
        sampler.update(3, 5);
        sampler.update(6, 1);
        assert_eq!(sampler.query(3), 7);
        assert_eq!(sampler.query(5), 7);
        assert_eq!(sampler.total(), 8);
        assert_eq!(sampler.sample(6), 3);
        assert_eq!(sampler.sample(7), 6);
    }

    #[test]
    fn zero_weight_indices_are_skipped() {
        let mut sampler = WeightedSampler::new(5);
        sampler.update(1, 3);
        sampler.update(4, 2);
        for target in 0..sampler.total() {
            let index = sampler.sample(target);
            assert!(index == 1 || index == 4);
        }
    }

    #[test]
    #[should_panic]
    fn update_rejects_out_of_range_index() {
        let mut sampler = WeightedSampler::new(4);
        sampler.update(4, 1);
    }

    #[test]
    #[should_panic]
    fn sample_rejects_target_at_total() {
        let mut sampler = WeightedSampler::new(4);
        sampler.update(0, 3);
        sampler.sample(3);
    }
}
