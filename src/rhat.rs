use crate::utils::{mean, sample_variance, split_chains, trim_chains};
use crate::Array1;
use anyhow::{anyhow, Error, Result};

/// Computes the potential scale reduction (Rhat) for the specified
/// parameter across all kept samples.  Chains are trimmed from the
/// back to match the length of the shortest chain.
///
/// See more details in Stan reference manual section
/// ["Potential Scale Reduction"](https://mc-stan.org/docs/2_24/reference-manual/notation-for-samples-chains-and-draws.html#potential-scale-reduction).
///
/// Based on reference implementation in Stan v2.24.0 at
/// [https://github.com/stan-dev/stan/blob/v2.24.0/src/stan/analyze/mcmc/compute_potential_scale_reduction.hpp]()
pub fn potential_scale_reduction_factor(chains: &[Array1]) -> Result<f64, Error> {
    let chains = trim_chains(chains)?;
    if chains.len() < 2 {
        return Err(anyhow!("Need at least two chains to compute Rhat"));
    }

    let mut chain_mean: Array1 = Vec::with_capacity(chains.len());
    let mut chain_var: Array1 = Vec::with_capacity(chains.len());
    for chain in chains.iter() {
        chain_mean.push(mean(chain)?);
        chain_var.push(sample_variance(chain)?);
    }

    let n = chains[0].len() as f64;
    let var_between = n * sample_variance(&chain_mean)?;
    let var_within = mean(&chain_var)?;
    Ok(((var_between / var_within + n - 1.0) / n).sqrt())
}

/// Computes the split potential scale reduction (Rhat) for the
/// specified parameter across all kept samples.  When the number of
/// total draws N is odd, the (N+1)/2th draw is ignored.
///
/// Chains are trimmed from the back to match the
/// length of the shortest chain.
///
/// Based on reference implementation in Stan v2.24.0 at
/// [https://github.com/stan-dev/stan/blob/v2.24.0/src/stan/analyze/mcmc/compute_potential_scale_reduction.hpp]()
pub fn split_potential_scale_reduction_factor(chains: &[Array1]) -> Result<f64, Error> {
    let split = split_chains(chains)?;
    potential_scale_reduction_factor(&split)
}
