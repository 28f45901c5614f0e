//! Monte Carlo null distribution of mean forward returns.
//!
//! Each simulation draws `k` returns with replacement from the unconditional
//! population and records their mean, giving the sampling distribution of "the
//! mean return of k random H-bar trades". This is a bootstrap under the null
//! that the signal picks trades indistinguishable from random, not a permutation
//! test: the population windows overlap and share instruments, so independence
//! does not hold.

use crate::domain::error::EdgecheckError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_SIMULATIONS: usize = 1000;
/// With M simulations the smallest non-zero p-value is 1/M.
pub const MIN_SIMULATIONS: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct NullDistribution {
    /// Simulated sample means, in draw order.
    pub values: Vec<f64>,
    pub mean: f64,
    /// Standard deviation with denominator M (population estimate).
    pub std: f64,
}

impl NullDistribution {
    pub fn from_values(values: Vec<f64>) -> Self {
        let (mean, std) = mean_and_std(&values);
        Self { values, mean, std }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullSampler {
    pub simulations: usize,
    pub seed: u64,
}

impl NullSampler {
    pub fn new(simulations: usize, seed: u64) -> Self {
        Self { simulations, seed }
    }

    pub fn validate(&self) -> Result<(), EdgecheckError> {
        if self.simulations < MIN_SIMULATIONS {
            return Err(EdgecheckError::InvalidParameter {
                name: "simulations".to_string(),
                reason: format!(
                    "{} is below the minimum of {}",
                    self.simulations, MIN_SIMULATIONS
                ),
            });
        }
        Ok(())
    }

    /// Draws `self.simulations` resamples of size `sample_size` from `population`.
    pub fn sample(
        &self,
        population: &[f64],
        sample_size: usize,
    ) -> Result<NullDistribution, EdgecheckError> {
        self.validate()?;
        if population.is_empty() {
            return Err(EdgecheckError::InvalidParameter {
                name: "population".to_string(),
                reason: "cannot resample from an empty population".to_string(),
            });
        }
        if sample_size == 0 {
            return Err(EdgecheckError::InvalidParameter {
                name: "sample_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let values = (0..self.simulations)
            .map(|_| {
                let total: f64 = (0..sample_size)
                    .map(|_| population[rng.gen_range(0..population.len())])
                    .sum();
                total / sample_size as f64
            })
            .collect();

        Ok(NullDistribution::from_values(values))
    }
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population() -> Vec<f64> {
        (0..100).map(|i| (i as f64 - 50.0) / 10.0).collect()
    }

    #[test]
    fn produces_m_values() {
        let null = NullSampler::new(500, 7).sample(&population(), 20).unwrap();
        assert_eq!(null.len(), 500);
    }

    #[test]
    fn same_seed_same_distribution() {
        let a = NullSampler::new(300, 42).sample(&population(), 15).unwrap();
        let b = NullSampler::new(300, 42).sample(&population(), 15).unwrap();
        assert_eq!(a.values, b.values);
    }

    #[test]
    fn different_seed_different_distribution() {
        let a = NullSampler::new(300, 1).sample(&population(), 15).unwrap();
        let b = NullSampler::new(300, 2).sample(&population(), 15).unwrap();
        assert_ne!(a.values, b.values);
    }

    #[test]
    fn constant_population_has_zero_std() {
        let null = NullSampler::new(200, 3).sample(&[1.5; 10], 4).unwrap();
        assert!(null.values.iter().all(|&v| (v - 1.5).abs() < 1e-12));
        assert!((null.mean - 1.5).abs() < 1e-12);
        assert_eq!(null.std, 0.0);
    }

    #[test]
    fn null_mean_tracks_population_mean() {
        let pop = population();
        let pop_mean = pop.iter().sum::<f64>() / pop.len() as f64;
        let null = NullSampler::new(2000, 11).sample(&pop, 30).unwrap();
        assert!((null.mean - pop_mean).abs() < 0.2);
    }

    #[test]
    fn std_uses_population_denominator() {
        let null = NullDistribution::from_values(vec![1.0, 3.0]);
        assert_eq!(null.mean, 2.0);
        // sqrt(((1-2)^2 + (3-2)^2) / 2) = 1
        assert!((null.std - 1.0).abs() < 1e-12);
    }

    #[test]
    fn too_few_simulations_rejected() {
        let result = NullSampler::new(199, 1).sample(&population(), 10);
        assert!(matches!(
            result,
            Err(EdgecheckError::InvalidParameter { name, .. }) if name == "simulations"
        ));
    }

    #[test]
    fn empty_population_rejected() {
        assert!(NullSampler::new(200, 1).sample(&[], 10).is_err());
    }

    #[test]
    fn zero_sample_size_rejected() {
        assert!(NullSampler::new(200, 1).sample(&population(), 0).is_err());
    }
}
