use crate::ess::{autocovariance, compute_effective_sample_size, compute_estimated_mcse};
use crate::gibbs::Chain;
use crate::rhat::split_potential_scale_reduction_factor;
use crate::utils::flatten;
use crate::{Array1, Array2};
use anyhow::{anyhow, Error, Result};
use average::Variance;
use log::warn;

/// R hat above this suggests the chains have not mixed.
pub const RHAT_WARN: f64 = 1.05;
/// ESS below this is too small for reliable tail summaries.
pub const ESS_WARN: f64 = 100.0;

/// Monte Carlo summary of a set of draws of one quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub n: usize,
    pub mean: f64,
    pub sd: f64,
    /// Standard error of the mean assuming independent draws
    pub se: f64,
    pub min: f64,
    pub max: f64,
    pub q05: f64,
    pub median: f64,
    pub q95: f64,
}

impl Summary {
    pub fn new(values: &[f64]) -> Result<Self, Error> {
        if values.is_empty() {
            return Err(anyhow!("Can't summarize an empty array"));
        }
        let var: Variance = values.iter().copied().collect();
        let n = values.len();
        let sd = if n > 1 {
            var.sample_variance().sqrt()
        } else {
            0.0
        };

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Ok(Summary {
            n,
            mean: var.mean(),
            sd,
            se: sd / (n as f64).sqrt(),
            min: sorted[0],
            max: sorted[n - 1],
            q05: quantile_sorted(&sorted, 0.05),
            median: quantile_sorted(&sorted, 0.5),
            q95: quantile_sorted(&sorted, 0.95),
        })
    }
}

/// Quantile of already sorted data, interpolating linearly between order
/// statistics.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let h = (sorted.len() - 1) as f64 * p.max(0.0).min(1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Pearson sample correlation of paired draws.
pub fn correlation(xs: &[f64], ys: &[f64]) -> Result<f64, Error> {
    if xs.len() != ys.len() {
        return Err(anyhow!(
            "Can't correlate arrays of different lengths ({} and {})",
            xs.len(),
            ys.len()
        ));
    }
    if xs.len() < 2 {
        return Err(anyhow!("Need at least two pairs to compute a correlation"));
    }
    let vx: Variance = xs.iter().copied().collect();
    let vy: Variance = ys.iter().copied().collect();
    let (mx, my) = (vx.mean(), vy.mean());
    let cov = xs
        .iter()
        .zip(ys.iter())
        .map(|(x, y)| (x - mx) * (y - my))
        .sum::<f64>()
        / (xs.len() as f64 - 1.0);
    let scale = (vx.sample_variance() * vy.sample_variance()).sqrt();
    if scale == 0.0 {
        return Err(anyhow!("Correlation undefined for constant arrays"));
    }
    Ok(cov / scale)
}

/// Autocorrelation of `values` at `lag`, using the same biased
/// autocovariance estimator as the ESS computation.
pub fn autocorrelation(values: &[f64], lag: usize) -> Result<f64, Error> {
    if lag >= values.len() {
        return Err(anyhow!(
            "Lag {} too large for {} values",
            lag,
            values.len()
        ));
    }
    let acov = autocovariance(values)?;
    if acov[0] == 0.0 {
        return Err(anyhow!("Autocorrelation undefined for constant arrays"));
    }
    Ok(acov[lag] / acov[0])
}

/// Summary and convergence diagnostics of one parameter across chains.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamReport {
    pub name: String,
    pub summary: Summary,
    pub ess: f64,
    pub rhat: f64,
    pub mcse: f64,
    /// Lag-1 autocorrelation averaged over chains
    pub lag1: f64,
}

impl ParamReport {
    pub fn new(name: &str, chains: &[Array1]) -> Result<Self, Error> {
        let summary = Summary::new(&flatten(chains))?;
        let ess = compute_effective_sample_size(chains)?;
        let rhat = split_potential_scale_reduction_factor(chains)?;
        let mcse = compute_estimated_mcse(chains)?;
        let lag1 = chains
            .iter()
            .map(|c| autocorrelation(c, 1))
            .collect::<Result<Array1>>()?;
        let lag1 = lag1.iter().sum::<f64>() / lag1.len() as f64;

        if rhat > RHAT_WARN {
            warn!("{}: Rhat {:.3} > {}", name, rhat, RHAT_WARN);
        }
        if ess < ESS_WARN {
            warn!("{}: ESS {:.0} < {}", name, ess, ESS_WARN);
        }

        Ok(ParamReport {
            name: name.to_string(),
            summary,
            ess,
            rhat,
            mcse,
            lag1,
        })
    }
}

/// Diagnostics for the `x` and `y` traces of a set of Gibbs chains.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainReport {
    pub num_chains: usize,
    pub num_draws: usize,
    pub params: Vec<ParamReport>,
    /// Correlation of the pooled `(x, y)` draws
    pub correlation: f64,
}

impl ChainReport {
    pub fn from_chains(chains: &[Chain]) -> Result<Self, Error> {
        let xs: Array2 = chains.iter().map(|c| c.xs()).collect();
        let ys: Array2 = chains.iter().map(|c| c.ys()).collect();
        let params = vec![ParamReport::new("x", &xs)?, ParamReport::new("y", &ys)?];
        let correlation = correlation(&flatten(&xs), &flatten(&ys))?;
        Ok(ChainReport {
            num_chains: chains.len(),
            num_draws: chains.iter().map(|c| c.len()).min().unwrap_or(0),
            params,
            correlation,
        })
    }

    /// Render the report as a plain text table.
    pub fn to_table(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "{} chains x {} draws per chain",
            self.num_chains, self.num_draws
        ));
        lines.push(String::new());
        lines.push(format!(
            "{:<6} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>8} {:>10} {:>7}",
            "param", "mean", "sd", "q5%", "q50%", "q95%", "ess", "rhat", "mcse", "ac1"
        ));
        lines.push("-".repeat(94));
        for p in &self.params {
            let s = &p.summary;
            lines.push(format!(
                "{:<6} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.0} {:>8.4} {:>10.6} {:>7.3}",
                p.name, s.mean, s.sd, s.q05, s.median, s.q95, p.ess, p.rhat, p.mcse, p.lag1
            ));
        }
        lines.push("-".repeat(94));
        lines.push(format!("corr(x, y) = {:.4}", self.correlation));

        if self.params.iter().any(|p| p.rhat > RHAT_WARN) {
            lines.push(format!(
                "Some Rhat values > {}; chains may not have converged.",
                RHAT_WARN
            ));
        }
        if self.params.iter().any(|p| p.ess < ESS_WARN) {
            lines.push(format!(
                "Some ESS values < {}; consider more draws.",
                ESS_WARN
            ));
        }
        lines.join("\n")
    }
}
