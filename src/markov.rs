use anyhow::{anyhow, Error, Result};
use rand::Rng;

/// Posterior standard deviation of a binomial success probability inferred
/// from `n` successes in `ntot` trials under a flat prior, i.e. the standard
/// deviation of a `Beta(n + 1, ntot - n + 1)` distribution.
pub fn sig_alpha(n: usize, ntot: usize) -> f64 {
    let (n, ntot) = (n as f64, ntot as f64);
    ((n + 1.0) * (ntot - n + 1.0) / (ntot + 2.0).powi(2) / (ntot + 3.0)).sqrt()
}

/// Markov chain on the states `0` and `1`, defined by its two state-change
/// probabilities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TwoStateMarkovChain {
    alpha: f64,
    beta: f64,
}

/// Empirical distribution of the state at one time step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarginalPmf {
    pub p0: f64,
    pub p1: f64,
    /// Posterior standard deviations of `p0` and `p1`
    pub sig0: f64,
    pub sig1: f64,
}

impl TwoStateMarkovChain {
    /// `alpha` is the probability of moving from state 0 to state 1 and
    /// `beta` the probability of moving from state 1 to state 0.
    pub fn new(alpha: f64, beta: f64) -> Result<Self, Error> {
        for (name, p) in [("alpha", alpha), ("beta", beta)].iter() {
            if !(0.0..=1.0).contains(p) {
                return Err(anyhow!("{} must be a probability, got {}", name, p));
            }
        }
        if alpha + beta == 0.0 {
            return Err(anyhow!(
                "alpha and beta can't both be zero; the chain has no equilibrium"
            ));
        }
        Ok(TwoStateMarkovChain { alpha, beta })
    }

    /// Right-multiplying transition matrix: `trans[j][i]` is the
    /// probability of moving from state `i` to state `j`.
    pub fn transition_matrix(&self) -> [[f64; 2]; 2] {
        [[1.0 - self.alpha, self.beta], [self.alpha, 1.0 - self.beta]]
    }

    /// Equilibrium probabilities of states 0 and 1.
    pub fn equilibrium(&self) -> (f64, f64) {
        let total = self.alpha + self.beta;
        (self.beta / total, self.alpha / total)
    }

    /// Take one step from `state`, which must be `0` or `1`.
    pub fn step<R: Rng + ?Sized>(&self, state: u8, rng: &mut R) -> Result<u8> {
        let p_one = self.transition_matrix()[1][state_index(state)?];
        Ok(u8::from(rng.gen_bool(p_one)))
    }

    /// Simulate a path of `len` steps from `initial`.  The path holds
    /// `len + 1` states, including the initial one.
    pub fn sim_path<R: Rng + ?Sized>(
        &self,
        len: usize,
        initial: u8,
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        state_index(initial)?;
        let mut path = Vec::with_capacity(len.saturating_add(1));
        let mut state = initial;
        path.push(state);
        for _ in 0..len {
            state = self.step(state, rng)?;
            path.push(state);
        }
        Ok(path)
    }

    /// Simulate `n` paths of `len` steps, drawing each initial state with
    /// `init`.
    pub fn sim_paths<R, F>(
        &self,
        n: usize,
        len: usize,
        mut init: F,
        rng: &mut R,
    ) -> Result<Vec<Vec<u8>>>
    where
        R: Rng + ?Sized,
        F: FnMut(&mut R) -> u8,
    {
        (0..n)
            .map(|_| {
                let initial = init(rng);
                self.sim_path(len, initial, rng)
            })
            .collect()
    }
}

fn state_index(state: u8) -> Result<usize> {
    match state {
        0 | 1 => Ok(usize::from(state)),
        _ => Err(anyhow!("State must be 0 or 1, got {}", state)),
    }
}

/// Estimate the distribution of the state at time `t` from a collection of
/// paths.
pub fn marginal_pmf(paths: &[Vec<u8>], t: usize) -> Result<MarginalPmf, Error> {
    let states = paths
        .iter()
        .map(|p| {
            p.get(t)
                .copied()
                .ok_or_else(|| anyhow!("Path of length {} has no step {}", p.len(), t))
        })
        .collect::<Result<Vec<u8>>>()?;
    if states.is_empty() {
        return Err(anyhow!("No paths to estimate a PMF from"));
    }
    let ntot = states.len();
    let n1 = states.iter().filter(|&&s| s == 1).count();
    let n0 = ntot - n1;
    Ok(MarginalPmf {
        p0: n0 as f64 / ntot as f64,
        p1: n1 as f64 / ntot as f64,
        sig0: sig_alpha(n0, ntot),
        sig1: sig_alpha(n1, ntot),
    })
}
