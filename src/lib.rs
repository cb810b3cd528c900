//! A Rust library for exploring Markov chain Monte Carlo on a bivariate normal
//! target: a random-scan Gibbs sampler built only on the full conditionals,
//! Monte Carlo summaries of its output, and MCMC diagnostics such as the
//! Gelman Rubin potential scale reduction factor (R hat), effective sample
//! size, chain splitting, and others.
//!
//! The diagnostics are sampler agnostic and work with the outputs of any MCMC
//! sampler (e.g. Stan, PyMC3, Turing.jl, or the Gibbs sampler in this crate).
#[macro_use]
extern crate approx;

/// Bivariate normal model with closed-form full conditionals
pub mod bvn;
/// Run configuration loaded from YAML
pub mod config;
/// Typed construction errors
pub mod error;
/// Effective Sample Size (ESS)
pub mod ess;
/// Random-scan two variable Gibbs sampler
pub mod gibbs;
/// Two state Markov chain simulation
pub mod markov;
/// Gelman-Rubin split potential scale reducation (Rhat)
pub mod rhat;
/// Monte Carlo summaries of sampler output
pub mod summary;
/// Convenience utilities like chain splitting and certain helper functions
/// (e.g. summary statistics and lightweight CSV reading and writing)
pub mod utils;

pub use bvn::BivariateNormal;
pub use error::{BvnError, ConfigError};
pub use gibbs::{Chain, ConditionalSampler, Coordinate, GibbsConfig, GibbsSampler, Sample};

/// One-dimensional vector of numeric values
pub type Array1 = Vec<f64>;
/// Two dimensional vector of vectors of numeric values
pub type Array2 = Vec<Array1>;
