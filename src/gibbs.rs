use crate::error::ConfigError;
use crate::Array1;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use serde::{Deserialize, Serialize};

/// A two variable target that can draw exactly from both of its full
/// conditionals.  This is all a Gibbs sampler needs to know about it.
pub trait ConditionalSampler {
    /// Draw `y ~ p(y | x)`.
    fn sample_y_given_x<R: Rng + ?Sized>(&self, x: f64, rng: &mut R) -> f64;

    /// Draw `x ~ p(x | y)`.
    fn sample_x_given_y<R: Rng + ?Sized>(&self, y: f64, rng: &mut R) -> f64;

    /// The point of marginal means, where chains start by default.
    fn mean_point(&self) -> (f64, f64);
}

/// One draw of the chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
}

/// The variable a Gibbs step updated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Coordinate {
    X,
    Y,
}

/// Where a chain starts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Start {
    /// At the target's marginal means
    Means,
    /// At an explicit point
    Point { x: f64, y: f64 },
}

impl Default for Start {
    fn default() -> Self {
        Start::Means
    }
}

/// Random-scan Gibbs sampler over two variables.
///
/// Each step flips a fair coin to decide which coordinate to update, then
/// redraws only that coordinate from its full conditional given the current
/// value of the other.  The coin is independent from step to step, so the
/// sampler does not strictly alternate between `x` and `y`.
///
/// The sampler is also an infinite [`Iterator`] over [`Sample`]s.
pub struct GibbsSampler<'a, T, R> {
    target: &'a T,
    rng: R,
    state: Sample,
}

impl<'a, T, R> GibbsSampler<'a, T, R>
where
    T: ConditionalSampler,
    R: Rng,
{
    /// New sampler positioned at the target's means.
    pub fn new(target: &'a T, rng: R) -> Self {
        Self::with_start(target, Start::Means, rng)
    }

    pub fn with_start(target: &'a T, start: Start, rng: R) -> Self {
        let state = match start {
            Start::Means => {
                let (x, y) = target.mean_point();
                Sample { x, y }
            }
            Start::Point { x, y } => Sample { x, y },
        };
        GibbsSampler { target, rng, state }
    }

    /// Current position of the chain.
    pub fn state(&self) -> Sample {
        self.state
    }

    /// Advance the chain one step, returning the coordinate that was
    /// updated and the new position.
    pub fn step(&mut self) -> (Coordinate, Sample) {
        let coord = if self.rng.gen_bool(0.5) {
            Coordinate::X
        } else {
            Coordinate::Y
        };
        match coord {
            Coordinate::X => {
                self.state.x = self.target.sample_x_given_y(self.state.y, &mut self.rng);
            }
            Coordinate::Y => {
                self.state.y = self.target.sample_y_given_x(self.state.x, &mut self.rng);
            }
        }
        (coord, self.state)
    }

    /// Run the chain for `n` steps and collect every resulting position.
    /// `n = 0` gives an empty chain.
    pub fn sample(&mut self, n: usize) -> Chain {
        let samples: Vec<Sample> = self.by_ref().take(n).collect();
        Chain::from(samples)
    }
}

impl<'a, T, R> Iterator for GibbsSampler<'a, T, R>
where
    T: ConditionalSampler,
    R: Rng,
{
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        Some(self.step().1)
    }
}

/// Draw `n` samples from `target` with a random-scan Gibbs sampler
/// started at its means.
pub fn gibbs<T, R>(target: &T, n: usize, rng: &mut R) -> Vec<Sample>
where
    T: ConditionalSampler,
    R: Rng,
{
    GibbsSampler::new(target, rng).take(n).collect()
}

/// An ordered sequence of draws from one chain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chain {
    samples: Vec<Sample>,
}

impl From<Vec<Sample>> for Chain {
    fn from(samples: Vec<Sample>) -> Self {
        Chain { samples }
    }
}

impl Chain {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Trace of the `x` coordinate.
    pub fn xs(&self) -> Array1 {
        self.samples.iter().map(|s| s.x).collect()
    }

    /// Trace of the `y` coordinate.
    pub fn ys(&self) -> Array1 {
        self.samples.iter().map(|s| s.y).collect()
    }

    /// Drop the first `n` draws.
    pub fn burn(&self, n: usize) -> Chain {
        let start = n.min(self.samples.len());
        Chain::from(self.samples[start..].to_vec())
    }

    /// Keep every `k`th draw, starting with the first.  `k = 0` is
    /// treated as 1.
    pub fn thin(&self, k: usize) -> Chain {
        Chain::from(self.samples.iter().step_by(k.max(1)).copied().collect::<Vec<_>>())
    }
}

/// Settings for running several independent chains.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GibbsConfig {
    /// Draws kept per chain after burn-in and thinning are applied to the
    /// raw steps, i.e. each chain runs `burn + n_draws * thin` steps
    pub n_draws: usize,
    pub n_chains: usize,
    pub burn: usize,
    pub thin: usize,
    /// Chain `i` is seeded with `seed + i`
    pub seed: u64,
    pub start: Start,
}

impl Default for GibbsConfig {
    fn default() -> Self {
        GibbsConfig {
            n_draws: 1000,
            n_chains: 4,
            burn: 0,
            thin: 1,
            seed: 1337,
            start: Start::Means,
        }
    }
}

impl GibbsConfig {
    /// Raw steps each chain runs, `burn + n_draws * thin`, or `None` if that
    /// does not fit in a `usize`.
    pub fn n_steps(&self) -> Option<usize> {
        self.n_draws
            .checked_mul(self.thin.max(1))
            .and_then(|steps| steps.checked_add(self.burn))
    }
}

/// Run `config.n_chains` independent chains against `target`.
///
/// Every chain owns a `Xoshiro256Plus` seeded from `config.seed` plus the
/// chain index, so the result is reproducible and does not depend on the
/// order chains are run in.  Fails with `ConfigError::TooManySteps` when
/// the step count overflows.
pub fn run_chains<T: ConditionalSampler>(
    target: &T,
    config: &GibbsConfig,
) -> Result<Vec<Chain>, ConfigError> {
    let thin = config.thin.max(1);
    let n_steps = config.n_steps().ok_or(ConfigError::TooManySteps {
        n_draws: config.n_draws,
        thin: config.thin,
        burn: config.burn,
    })?;
    info!(
        "Running {} chains of {} steps (burn {}, thin {})",
        config.n_chains, n_steps, config.burn, thin
    );
    let chains = (0..config.n_chains)
        .map(|i| {
            let rng = Xoshiro256Plus::seed_from_u64(config.seed.wrapping_add(i as u64));
            let mut sampler = GibbsSampler::with_start(target, config.start, rng);
            let chain = sampler.sample(n_steps).burn(config.burn).thin(thin);
            debug!("Chain {} finished with {} draws", i, chain.len());
            chain
        })
        .collect();
    Ok(chains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvn::BivariateNormal;
    use crate::summary::{autocorrelation, correlation};
    use crate::utils::mean;

    fn rng(seed: u64) -> Xoshiro256Plus {
        Xoshiro256Plus::seed_from_u64(seed)
    }

    /// Deterministic conditionals: each update sets one coordinate to the
    /// other plus one.
    struct Marker;

    impl ConditionalSampler for Marker {
        fn sample_y_given_x<R: Rng + ?Sized>(&self, x: f64, _rng: &mut R) -> f64 {
            x + 1.0
        }

        fn sample_x_given_y<R: Rng + ?Sized>(&self, y: f64, _rng: &mut R) -> f64 {
            y + 1.0
        }

        fn mean_point(&self) -> (f64, f64) {
            (0.0, 0.0)
        }
    }

    #[test]
    fn test_chain_length() {
        let bvn = BivariateNormal::standard(0.5).unwrap();
        for &n in [0, 1, 2, 17, 1000].iter() {
            let samples = gibbs(&bvn, n, &mut rng(n as u64));
            assert_eq!(samples.len(), n);
        }
        let mut sampler = GibbsSampler::new(&bvn, rng(1));
        assert!(sampler.sample(0).is_empty());
    }

    #[test]
    fn test_exactly_one_coordinate_changes() {
        let bvn = BivariateNormal::new([1.0, -1.0], [1.0, 3.0], 0.7).unwrap();
        let samples = gibbs(&bvn, 2000, &mut rng(3));
        for pair in samples.windows(2) {
            let x_changed = pair[0].x != pair[1].x;
            let y_changed = pair[0].y != pair[1].y;
            assert!(x_changed ^ y_changed);
        }
    }

    #[test]
    fn test_step_reports_updated_coordinate() {
        let bvn = BivariateNormal::standard(0.3).unwrap();
        let mut sampler = GibbsSampler::new(&bvn, rng(11));
        let mut prev = sampler.state();
        assert_eq!(prev, Sample { x: 0.0, y: 0.0 });
        for _ in 0..500 {
            let (coord, next) = sampler.step();
            match coord {
                Coordinate::X => assert_eq!(prev.y, next.y),
                Coordinate::Y => assert_eq!(prev.x, next.x),
            }
            prev = next;
        }
    }

    #[test]
    fn test_random_scan_is_fair_and_not_alternating() {
        let mut sampler = GibbsSampler::new(&Marker, rng(5));
        let coords: Vec<Coordinate> = (0..10_000).map(|_| sampler.step().0).collect();
        let n_x = coords.iter().filter(|&&c| c == Coordinate::X).count();
        assert!(n_x > 4700 && n_x < 5300, "n_x = {}", n_x);
        let repeats = coords.windows(2).filter(|w| w[0] == w[1]).count();
        assert!(repeats > 4000, "repeats = {}", repeats);
    }

    #[test]
    fn test_start_point() {
        let start = Start::Point { x: 5.0, y: -5.0 };
        let mut sampler = GibbsSampler::with_start(&Marker, start, rng(0));
        assert_eq!(sampler.state(), Sample { x: 5.0, y: -5.0 });
        let (coord, s) = sampler.step();
        match coord {
            Coordinate::X => assert_eq!(s, Sample { x: -4.0, y: -5.0 }),
            Coordinate::Y => assert_eq!(s, Sample { x: 5.0, y: 6.0 }),
        }
    }

    #[test]
    fn test_deterministic_given_seed() {
        let bvn = BivariateNormal::standard(0.5).unwrap();
        let a = gibbs(&bvn, 100, &mut rng(42));
        let b = gibbs(&bvn, 100, &mut rng(42));
        let c = gibbs(&bvn, 100, &mut rng(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_symmetric_target_mean_converges() {
        let bvn = BivariateNormal::new([2.0, -3.0], [1.0, 1.0], 0.0).unwrap();
        let chain = Chain::from(gibbs(&bvn, 10_000, &mut rng(2020)));
        assert_abs_diff_eq!(mean(&chain.xs()).unwrap(), 2.0, epsilon = 0.1);
        assert_abs_diff_eq!(mean(&chain.ys()).unwrap(), -3.0, epsilon = 0.1);
    }

    // A single 1000-draw random-scan chain lands outside these bounds for
    // about a third of seeds, so the fixed-seed check uses 10,000 draws.
    #[test]
    fn test_correlated_target_moments() {
        let bvn = BivariateNormal::standard(0.5).unwrap();
        let chain = Chain::from(gibbs(&bvn, 10_000, &mut rng(2018)));
        let (xs, ys) = (chain.xs(), chain.ys());
        assert_abs_diff_eq!(mean(&xs).unwrap(), 0.0, epsilon = 0.1);
        assert_abs_diff_eq!(mean(&ys).unwrap(), 0.0, epsilon = 0.1);
        assert_abs_diff_eq!(correlation(&xs, &ys).unwrap(), 0.5, epsilon = 0.15);
    }

    #[test]
    fn test_short_correlated_chains_mostly_within_bounds() {
        let bvn = BivariateNormal::standard(0.5).unwrap();
        let n_seeds = 200;
        let n_within = (0..n_seeds)
            .filter(|&seed| {
                let chain = Chain::from(gibbs(&bvn, 1000, &mut rng(seed)));
                let (xs, ys) = (chain.xs(), chain.ys());
                mean(&xs).unwrap().abs() < 0.1
                    && mean(&ys).unwrap().abs() < 0.1
                    && (correlation(&xs, &ys).unwrap() - 0.5).abs() < 0.15
            })
            .count();
        assert!(n_within >= n_seeds as usize / 2, "n_within = {}", n_within);
    }

    #[test]
    fn test_mixing_degrades_with_correlation() {
        let moderate = BivariateNormal::standard(0.5).unwrap();
        let strong = BivariateNormal::standard(0.97).unwrap();
        let xs_moderate = Chain::from(gibbs(&moderate, 5000, &mut rng(9))).xs();
        let xs_strong = Chain::from(gibbs(&strong, 5000, &mut rng(9))).xs();
        let ac_moderate = autocorrelation(&xs_moderate, 1).unwrap();
        let ac_strong = autocorrelation(&xs_strong, 1).unwrap();
        assert!(ac_strong > ac_moderate + 0.2);
        assert!(ac_strong > 0.9);
    }

    #[test]
    fn test_burn_and_thin() {
        let samples: Vec<Sample> = (0..10)
            .map(|i| Sample {
                x: i as f64,
                y: -(i as f64),
            })
            .collect();
        let chain = Chain::from(samples);
        assert_eq!(chain.burn(3).xs(), vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(chain.thin(3).xs(), vec![0.0, 3.0, 6.0, 9.0]);
        assert_eq!(chain.thin(0), chain);
        assert!(chain.burn(20).is_empty());
        assert_eq!(chain.burn(2).thin(4).ys(), vec![-2.0, -6.0]);
    }

    #[test]
    fn test_run_chains() {
        let bvn = BivariateNormal::standard(0.5).unwrap();
        let config = GibbsConfig {
            n_draws: 200,
            n_chains: 3,
            burn: 50,
            thin: 2,
            seed: 7,
            start: Start::Point { x: 4.0, y: 4.0 },
        };
        let chains = run_chains(&bvn, &config).unwrap();
        assert_eq!(chains.len(), 3);
        assert!(chains.iter().all(|c| c.len() == 200));
        assert_ne!(chains[0], chains[1]);
        assert_eq!(chains, run_chains(&bvn, &config).unwrap());

        let none = GibbsConfig {
            n_draws: 0,
            ..GibbsConfig::default()
        };
        assert!(run_chains(&bvn, &none)
            .unwrap()
            .iter()
            .all(|c| c.is_empty()));
    }

    #[test]
    fn test_n_steps() {
        let config = GibbsConfig {
            n_draws: 200,
            burn: 50,
            thin: 2,
            ..GibbsConfig::default()
        };
        assert_eq!(config.n_steps(), Some(450));
        let unthinned = GibbsConfig {
            thin: 0,
            ..config.clone()
        };
        assert_eq!(unthinned.n_steps(), Some(250));
    }

    #[test]
    fn test_run_chains_rejects_overflowing_step_count() {
        let bvn = BivariateNormal::standard(0.5).unwrap();
        let too_long = GibbsConfig {
            n_draws: usize::MAX / 2 + 1,
            thin: 2,
            n_chains: 1,
            ..GibbsConfig::default()
        };
        assert_eq!(too_long.n_steps(), None);
        assert!(matches!(
            run_chains(&bvn, &too_long),
            Err(ConfigError::TooManySteps { thin: 2, .. })
        ));

        let burn_overflows = GibbsConfig {
            n_draws: usize::MAX,
            burn: 1,
            n_chains: 1,
            ..GibbsConfig::default()
        };
        assert_eq!(burn_overflows.n_steps(), None);
        assert!(run_chains(&bvn, &burn_overflows).is_err());
    }
}
