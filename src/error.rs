use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised when a bivariate normal cannot be constructed from the
/// supplied parameters.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum BvnError {
    /// A marginal mean was NaN or infinite
    #[error("mean of {axis} must be finite, got {value}")]
    InvalidMean { axis: char, value: f64 },
    /// A marginal standard deviation was not finite and positive
    #[error("standard deviation of {axis} must be finite and positive, got {value}")]
    InvalidSigma { axis: char, value: f64 },
    /// The correlation coefficient was outside the open interval (-1, 1)
    #[error("correlation coefficient must lie in (-1, 1), got {0}")]
    InvalidRho(f64),
}

/// Errors raised while loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid bivariate normal in config: {0}")]
    Bvn(#[from] BvnError),
    #[error("n_chains must be at least one")]
    ZeroChains,
    #[error("n_draws must be at least one")]
    ZeroDraws,
    #[error("thin must be at least one")]
    ZeroThin,
    #[error("burn + n_draws * thin overflows (n_draws {n_draws}, thin {thin}, burn {burn})")]
    TooManySteps {
        n_draws: usize,
        thin: usize,
        burn: usize,
    },
}
