use crate::bvn::BivariateNormal;
use crate::error::ConfigError;
use crate::gibbs::GibbsConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters of the bivariate normal target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BvnConfig {
    #[serde(default)]
    pub means: [f64; 2],
    #[serde(default = "unit_sigs")]
    pub sigs: [f64; 2],
    pub rho: f64,
}

fn unit_sigs() -> [f64; 2] {
    [1.0, 1.0]
}

/// A full Gibbs run: the target and how to sample it.
///
/// ```yaml
/// bvn:
///   means: [0.0, 0.0]
///   sigs: [1.0, 1.0]
///   rho: 0.5
/// sampler:
///   n_draws: 1000
///   n_chains: 4
///   burn: 100
///   thin: 1
///   seed: 1337
///   start:
///     kind: point
///     x: 3.0
///     y: -3.0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub bvn: BvnConfig,
    #[serde(default)]
    pub sampler: GibbsConfig,
}

impl RunConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bivariate_normal()?;
        if self.sampler.n_chains == 0 {
            return Err(ConfigError::ZeroChains);
        }
        if self.sampler.n_draws == 0 {
            return Err(ConfigError::ZeroDraws);
        }
        if self.sampler.thin == 0 {
            return Err(ConfigError::ZeroThin);
        }
        if self.sampler.n_steps().is_none() {
            return Err(ConfigError::TooManySteps {
                n_draws: self.sampler.n_draws,
                thin: self.sampler.thin,
                burn: self.sampler.burn,
            });
        }
        Ok(())
    }

    pub fn bivariate_normal(&self) -> Result<BivariateNormal, ConfigError> {
        let bvn = BivariateNormal::new(self.bvn.means, self.bvn.sigs, self.bvn.rho)?;
        Ok(bvn)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
