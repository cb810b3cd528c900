use crate::gibbs::Chain;
use crate::{Array1, Array2};
use anyhow::{anyhow, Context, Error, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

/// Compute the arithmetic mean of an array.
pub fn mean(arr: &[f64]) -> Result<f64, Error> {
    if arr.is_empty() {
        return Err(anyhow!("Can't take mean of empty array"));
    }
    let sum = arr.iter().sum::<f64>();
    let count = arr.len() as f64;
    Ok(sum / count)
}

/// Compute the sample variance of an array using Bessel's correction.
pub fn sample_variance(arr: &[f64]) -> Result<f64, Error> {
    if arr.len() < 2 {
        return Err(anyhow!("Need at least two values for a sample variance"));
    }
    let xbar = mean(arr)?;
    Ok(arr.iter().map(|x| (x - xbar).powi(2)).sum::<f64>() / (arr.len() as f64 - 1.0))
}

/// Length of the shortest chain, or an error when there are no chains.
pub fn min_len(chains: &[Array1]) -> Result<usize, Error> {
    chains
        .iter()
        .map(|c| c.len())
        .min()
        .ok_or_else(|| anyhow!("No chains given"))
}

/// Trim every chain from the back to the length of the shortest one.
pub fn trim_chains(chains: &[Array1]) -> Result<Array2, Error> {
    let num_draws = min_len(chains)?;
    Ok(chains.iter().map(|c| c[..num_draws].to_vec()).collect())
}

/// Splits each chain into two chains of equal length.  When the
/// number of total draws N is odd, the (N+1)/2th draw is ignored.
///
/// See more details in Stan reference manual section
/// ["Effective Sample Size"](http://mc-stan.org/users/documentation).
///
/// Chains are trimmed to the length of the shortest chain first.
pub fn split_chains(chains: &[Array1]) -> Result<Array2, Error> {
    let num_draws = min_len(chains).context("Can't split empty array of chains")?;
    if num_draws < 1 {
        return Err(anyhow!("No samples to split"));
    }
    let half = num_draws / 2;
    let offset = num_draws % 2;
    let mut split_draws = Vec::with_capacity(2 * chains.len());
    for chain in chains {
        split_draws.push(chain[..half].to_vec());
        split_draws.push(chain[(half + offset)..num_draws].to_vec());
    }
    Ok(split_draws)
}

/// Concatenate all chains into a single array.
pub fn flatten(chains: &[Array1]) -> Array1 {
    chains.iter().flat_map(|c| c.iter().copied()).collect()
}

/// Read numeric CSV columns, skipping `skip_rows` lines and reading at most
/// `n_rows`.  Column `i` of the file becomes `result[i]`.
pub fn read_csv<P: AsRef<Path>>(path: P, skip_rows: usize, n_rows: usize) -> Result<Array2> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("Can't open {}", path.display()))?;
    let mut result: Array2 = Vec::new();
    for (row, line) in BufReader::new(f)
        .lines()
        .skip(skip_rows)
        .take(n_rows)
        .enumerate()
    {
        let line = line?;
        for (idx, value) in line.split(',').enumerate() {
            if idx >= result.len() {
                result.push(Vec::new())
            }
            let value = value.trim().parse::<f64>().with_context(|| {
                format!("Bad value {:?} in column {} of row {}", value, idx, row + skip_rows)
            })?;
            result[idx].push(value);
        }
    }
    Ok(result)
}

/// Write chains as `chain,draw,x,y` rows with a header.
pub fn write_chains_csv<W: Write>(chains: &[Chain], writer: W) -> Result<()> {
    let mut out = BufWriter::new(writer);
    writeln!(out, "chain,draw,x,y")?;
    for (c, chain) in chains.iter().enumerate() {
        for (i, s) in chain.samples().iter().enumerate() {
            writeln!(out, "{},{},{},{}", c, i, s.x, s.y)?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gibbs::Sample;
    use crate::Array1;
    use std::path::PathBuf;

    #[test]
    fn test_stats() {
        // Test our basic stats functions using numbers computed with numpy.
        let arr = vec![
            2.13829088,
            -1.06214379,
            -0.79265699,
            -0.21300888,
            -1.07155142,
            -0.50425317,
            0.95708854,
            -1.23854172,
            1.37124938,
            1.17658286,
        ];
        let empty: Array1 = vec![];
        assert_abs_diff_eq!(
            sample_variance(&arr).unwrap(),
            1.492596054209826,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(mean(&arr).unwrap(), 0.07610557018217139, epsilon = 1e-6);

        assert!(sample_variance(&empty).is_err());
        assert!(sample_variance(&[1.0]).is_err());
        assert!(mean(&empty).is_err());
    }

    #[test]
    fn test_split_empty_chains() {
        // Make sure the we Err on empty or minimum 0 length chains
        let chains = vec![vec![1.0], vec![], vec![]];
        assert!(split_chains(&chains).is_err());

        let chains: Array2 = vec![vec![], vec![]];
        assert!(split_chains(&chains).is_err());

        let chains: Array2 = vec![];
        assert!(split_chains(&chains).is_err());
    }

    #[test]
    fn test_split_even_chains() {
        let chains = vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0]];
        let split = split_chains(&chains).unwrap();
        assert_eq!(split[0], vec![1.0, 2.0]);
        assert_eq!(split[1], vec![3.0, 4.0]);
        assert_eq!(split[2], vec![5.0, 6.0]);
        assert_eq!(split[3], vec![7.0, 8.0]);
    }

    #[test]
    fn test_split_odd_chains() {
        // Make sure the middle value gets dropped per the Stan reference implementation
        let chains = vec![vec![1.0, 2.0, 3.0, 4.0, 4.5], vec![5.0, 6.0, 7.0, 8.0, 8.5]];
        let split = split_chains(&chains).unwrap();
        assert_eq!(split[0], vec![1.0, 2.0]);
        assert_eq!(split[1], vec![4.0, 4.5]);
        assert_eq!(split[2], vec![5.0, 6.0]);
        assert_eq!(split[3], vec![8.0, 8.5]);
    }

    #[test]
    fn test_split_uneven_chains_trims_to_shortest() {
        let chains = vec![vec![1.0, 2.0, 3.0, 4.0, 9.0, 9.0], vec![5.0, 6.0, 7.0, 8.0]];
        let split = split_chains(&chains).unwrap();
        assert_eq!(split[1], vec![3.0, 4.0]);
        assert_eq!(split[3], vec![7.0, 8.0]);
        assert_eq!(trim_chains(&chains).unwrap()[0], vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_flatten() {
        let chains = vec![vec![1.0, 2.0], vec![], vec![3.0]];
        assert_eq!(flatten(&chains), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_csv_round_trip() {
        let chains = vec![
            Chain::from(vec![Sample { x: 0.5, y: -1.0 }, Sample { x: 1.5, y: 2.0 }]),
            Chain::from(vec![Sample { x: 3.0, y: 4.25 }]),
        ];
        let mut buf: Vec<u8> = Vec::new();
        write_chains_csv(&chains, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "chain,draw,x,y\n0,0,0.5,-1\n0,1,1.5,2\n1,0,3,4.25\n");

        let path: PathBuf =
            std::env::temp_dir().join(format!("bvn_mcmc_utils_{}.csv", std::process::id()));
        std::fs::write(&path, &text).unwrap();
        let cols = read_csv(&path, 1, 10).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(cols.len(), 4);
        assert_eq!(cols[0], vec![0.0, 0.0, 1.0]);
        assert_eq!(cols[2], vec![0.5, 1.5, 3.0]);
        assert_eq!(cols[3], vec![-1.0, 2.0, 4.25]);
    }

    #[test]
    fn test_read_csv_errors() {
        assert!(read_csv("/definitely/not/here.csv", 0, 10).is_err());

        let path = std::env::temp_dir().join(format!("bvn_mcmc_bad_{}.csv", std::process::id()));
        std::fs::write(&path, "1.0,abc\n").unwrap();
        let result = read_csv(&path, 0, 10);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }
}
