use bvn_mcmc::config::{BvnConfig, RunConfig};
use bvn_mcmc::gibbs::{run_chains, GibbsConfig, Start};
use bvn_mcmc::summary::ChainReport;
use bvn_mcmc::utils::write_chains_csv;
use clap::Parser;
use env_logger::Env;
use log::{error, info, LevelFilter};
use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

/// Run random-scan Gibbs chains on a bivariate normal and report diagnostics
#[derive(Parser, Debug)]
#[clap(rename_all = "kebab")]
struct Opt {
    /// YAML run config. Overrides the inline target and sampler flags
    #[clap(long, short)]
    config: Option<PathBuf>,
    /// Correlation coefficient of a standard bivariate normal target
    #[clap(long, default_value = "0.5", allow_hyphen_values = true)]
    rho: f64,
    #[clap(long, default_value = "1000")]
    n_draws: usize,
    #[clap(long, default_value = "4")]
    n_chains: usize,
    #[clap(long, default_value = "0")]
    burn: usize,
    #[clap(long, default_value = "1")]
    thin: usize,
    #[clap(long, default_value = "1337")]
    seed: u64,
    /// Write the draws as `chain,draw,x,y` CSV
    #[clap(long, short)]
    output: Option<PathBuf>,
    /// Log level (overrides RUST_LOG)
    #[clap(long)]
    log_level: Option<String>,
}

impl Opt {
    fn run_config(&self) -> Result<RunConfig, bvn_mcmc::ConfigError> {
        match self.config {
            Some(ref path) => RunConfig::from_path(path),
            None => {
                let config = RunConfig {
                    bvn: BvnConfig {
                        means: [0.0, 0.0],
                        sigs: [1.0, 1.0],
                        rho: self.rho,
                    },
                    sampler: GibbsConfig {
                        n_draws: self.n_draws,
                        n_chains: self.n_chains,
                        burn: self.burn,
                        thin: self.thin,
                        seed: self.seed,
                        start: Start::Means,
                    },
                };
                config.validate()?;
                Ok(config)
            }
        }
    }
}

fn run(opt: &Opt) -> anyhow::Result<()> {
    let config = opt.run_config()?;
    let bvn = config.bivariate_normal()?;
    info!(
        "Target: means {:?}, sigs {:?}, rho {}",
        bvn.means(),
        bvn.sigs(),
        bvn.rho()
    );

    let chains = run_chains(&bvn, &config.sampler)?;

    if let Some(ref path) = opt.output {
        let file = File::create(path)?;
        write_chains_csv(&chains, file)?;
        info!("Wrote draws to {}", path.display());
    }

    let report = ChainReport::from_chains(&chains)?;
    println!("{}", report.to_table());
    Ok(())
}

fn main() {
    let opt = Opt::parse();

    let env = Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(ref level) = opt.log_level {
        match LevelFilter::from_str(level) {
            Ok(level) => {
                builder.filter(None, level);
            }
            Err(_) => {
                eprintln!("Invalid log level '{}'", level);
                process::exit(2);
            }
        }
    }
    builder.init();

    if let Err(err) = run(&opt) {
        error!("{:#}", err);
        process::exit(1);
    }
}
