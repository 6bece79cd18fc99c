//! Bounded box spaces.
use ndarray::Array1;

/// A box in `R^n` described by per-component lower and upper bounds.
///
/// Used to declare action and observation spaces and the admissible cost
/// range of an environment. The space only declares bounds; sampling and
/// validation of arbitrary values is the concern of the caller.
#[derive(Clone, Debug)]
pub struct BoxSpace {
    low: Array1<f64>,
    high: Array1<f64>,
}

impl BoxSpace {
    /// Constructs a box from per-component bounds.
    ///
    /// Panics if the bound vectors differ in length or `low[i] > high[i]`
    /// for some component.
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Self {
        assert_eq!(low.len(), high.len(), "bound vectors differ in length");
        assert!(
            low.iter().zip(high.iter()).all(|(l, h)| l <= h),
            "low bound above high bound"
        );
        Self {
            low: Array1::from(low),
            high: Array1::from(high),
        }
    }

    /// Constructs a symmetric box `[-bound, bound]^n`.
    pub fn symmetric(bound: Vec<f64>) -> Self {
        let low = bound.iter().map(|b| -b).collect();
        Self::new(low, bound)
    }

    /// The number of components.
    pub fn len(&self) -> usize {
        self.low.len()
    }

    /// Returns `true` if the space has no components.
    pub fn is_empty(&self) -> bool {
        self.low.is_empty()
    }

    /// Lower bounds.
    pub fn low(&self) -> &Array1<f64> {
        &self.low
    }

    /// Upper bounds.
    pub fn high(&self) -> &Array1<f64> {
        &self.high
    }

    /// Returns `true` if every component of `v` lies within the bounds.
    pub fn contains(&self, v: &[f64]) -> bool {
        v.len() == self.len()
            && v.iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(x, (l, h))| *x >= *l && *x <= *h)
    }

    /// Clips `v` component-wise to the bounds.
    pub fn clip(&self, v: &Array1<f64>) -> Array1<f64> {
        let mut out = v.clone();
        for (x, (l, h)) in out.iter_mut().zip(self.low.iter().zip(self.high.iter())) {
            *x = x.max(*l).min(*h);
        }
        out
    }

    /// Draws a uniform sample within the bounds.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Array1<f64> {
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(l, h)| l + rng.f64() * (h - l))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::BoxSpace;
    use ndarray::arr1;

    #[test]
    fn test_contains_and_clip() {
        let space = BoxSpace::new(vec![-5.0, -5.0], vec![5.0, 5.0]);
        assert!(space.contains(&[0.0, 4.9]));
        assert!(!space.contains(&[0.0, 5.1]));
        assert!(!space.contains(&[0.0]));

        let clipped = space.clip(&arr1(&[-7.0, 3.0]));
        assert_eq!(clipped, arr1(&[-5.0, 3.0]));
    }

    #[test]
    fn test_sample_within_bounds() {
        let space = BoxSpace::new(vec![0.0, -1.0], vec![1.0, 1.0]);
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..100 {
            let s = space.sample(&mut rng);
            assert!(space.contains(s.as_slice().unwrap()));
        }
    }
}
