use crate::error::BvnError;
use crate::gibbs::ConditionalSampler;
use crate::{Array1, Array2};
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::PI;

const LN_2PI: f64 = 1.837_877_066_409_345_5;

fn ln_normal(value: f64, mean: f64, sig: f64) -> f64 {
    let z = (value - mean) / sig;
    -0.5 * LN_2PI - sig.ln() - 0.5 * z * z
}

/// Bivariate normal distribution described by its marginal means, marginal
/// standard deviations and correlation coefficient, along with the
/// regression lines and conditional standard deviations of both full
/// conditionals.
#[derive(Clone, Debug, PartialEq)]
pub struct BivariateNormal {
    means: [f64; 2],
    sigs: [f64; 2],
    rho: f64,
    // y | x
    slope_y: f64,
    int_y: f64,
    csig_y: f64,
    // x | y
    slope_x: f64,
    int_x: f64,
    csig_x: f64,
}

impl BivariateNormal {
    /// Define the BVN from its marginal means, marginal standard deviations
    /// and the correlation coefficient `rho`, which must lie strictly
    /// between -1 and 1.
    ///
    /// # Example
    /// ```
    /// use bvn_mcmc::BivariateNormal;
    ///
    /// let bvn = BivariateNormal::new([0.0, 0.0], [1.0, 2.0], 0.5).unwrap();
    /// assert_eq!(bvn.y_given_x(1.0), 1.0);
    /// assert!(BivariateNormal::new([0.0, 0.0], [1.0, 1.0], 1.0).is_err());
    /// ```
    pub fn new(means: [f64; 2], sigs: [f64; 2], rho: f64) -> Result<Self, BvnError> {
        for (&value, axis) in means.iter().zip(['x', 'y'].iter()) {
            if !value.is_finite() {
                return Err(BvnError::InvalidMean { axis: *axis, value });
            }
        }
        for (&value, axis) in sigs.iter().zip(['x', 'y'].iter()) {
            if !(value.is_finite() && value > 0.0) {
                return Err(BvnError::InvalidSigma { axis: *axis, value });
            }
        }
        // NaN fails this comparison too
        if !(rho.abs() < 1.0) {
            return Err(BvnError::InvalidRho(rho));
        }

        let shrink = (1.0 - rho * rho).sqrt();
        let slope_y = rho * sigs[1] / sigs[0];
        let slope_x = rho * sigs[0] / sigs[1];
        Ok(BivariateNormal {
            means,
            sigs,
            rho,
            slope_y,
            int_y: means[1] - slope_y * means[0],
            csig_y: sigs[1] * shrink,
            slope_x,
            int_x: means[0] - slope_x * means[1],
            csig_x: sigs[0] * shrink,
        })
    }

    /// Standard normal marginals with correlation `rho`.
    pub fn standard(rho: f64) -> Result<Self, BvnError> {
        BivariateNormal::new([0.0, 0.0], [1.0, 1.0], rho)
    }

    pub fn means(&self) -> [f64; 2] {
        self.means
    }

    pub fn sigs(&self) -> [f64; 2] {
        self.sigs
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// Covariance matrix, row major.
    pub fn covariance(&self) -> [[f64; 2]; 2] {
        let cross = self.rho * self.sigs[0] * self.sigs[1];
        [
            [self.sigs[0] * self.sigs[0], cross],
            [cross, self.sigs[1] * self.sigs[1]],
        ]
    }

    /// Conditional expectation of `y` given `x` (the y on x regression line).
    pub fn y_given_x(&self, x: f64) -> f64 {
        self.int_y + self.slope_y * x
    }

    /// Conditional expectation of `x` given `y` (the x on y regression line).
    pub fn x_given_y(&self, y: f64) -> f64 {
        self.int_x + self.slope_x * y
    }

    /// Standard deviation of `y | x`; it does not depend on `x`.
    pub fn cond_sig_y(&self) -> f64 {
        self.csig_y
    }

    /// Standard deviation of `x | y`; it does not depend on `y`.
    pub fn cond_sig_x(&self) -> f64 {
        self.csig_x
    }

    /// Log of the joint density at `(x, y)`.
    pub fn ln_pdf(&self, x: f64, y: f64) -> f64 {
        let one_m_rho2 = 1.0 - self.rho * self.rho;
        let zx = (x - self.means[0]) / self.sigs[0];
        let zy = (y - self.means[1]) / self.sigs[1];
        let quad = zx * zx - 2.0 * self.rho * zx * zy + zy * zy;
        -LN_2PI - self.sigs[0].ln() - self.sigs[1].ln() - 0.5 * one_m_rho2.ln()
            - quad / (2.0 * one_m_rho2)
    }

    /// Joint density at `(x, y)`.
    pub fn pdf(&self, x: f64, y: f64) -> f64 {
        self.ln_pdf(x, y).exp()
    }

    /// Log density of `y` under the conditional `p(y | x)`.
    pub fn ln_cond_pdf_y(&self, y: f64, x: f64) -> f64 {
        ln_normal(y, self.y_given_x(x), self.csig_y)
    }

    /// Density of `y` under the conditional `p(y | x)`.
    pub fn cond_pdf_y(&self, y: f64, x: f64) -> f64 {
        self.ln_cond_pdf_y(y, x).exp()
    }

    /// Log density of `x` under the conditional `p(x | y)`.
    pub fn ln_cond_pdf_x(&self, x: f64, y: f64) -> f64 {
        ln_normal(x, self.x_given_y(y), self.csig_x)
    }

    /// Density of `x` under the conditional `p(x | y)`.
    pub fn cond_pdf_x(&self, x: f64, y: f64) -> f64 {
        self.ln_cond_pdf_x(x, y).exp()
    }

    /// Draw a single exact sample from the joint distribution.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let z1: f64 = rng.sample(StandardNormal);
        let z2: f64 = rng.sample(StandardNormal);
        let shrink = (1.0 - self.rho * self.rho).sqrt();
        let x = self.means[0] + self.sigs[0] * z1;
        let y = self.means[1] + self.sigs[1] * (self.rho * z1 + shrink * z2);
        (x, y)
    }

    /// Return `n` independent samples from the joint distribution as two
    /// vectors of x and y coordinates.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> (Array1, Array1) {
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        for _ in 0..n {
            let (x, y) = self.draw(rng);
            xs.push(x);
            ys.push(y);
        }
        (xs, ys)
    }

    /// Axis vectors for plotting, spanning `mean +/- fac * sig` with `n`
    /// evenly spaced points on each axis.
    pub fn grid(&self, n: usize, fac: f64) -> Grid {
        let axis = |i: usize| -> Array1 {
            let lo = self.means[i] - fac * self.sigs[i];
            let hi = self.means[i] + fac * self.sigs[i];
            linspace(lo, hi, n)
        };
        Grid {
            x: axis(0),
            y: axis(1),
        }
    }

    /// Log density over a plotting grid relative to its peak.  Row `j`
    /// runs over the x values at `y[j]`, so element `[j][i]` corresponds to
    /// `(x[i], y[j])`.
    pub fn ln_pdf_grid(&self, grid: &Grid) -> Array2 {
        let peak = self.ln_pdf(self.means[0], self.means[1]);
        grid.y
            .iter()
            .map(|&y| grid.x.iter().map(|&x| self.ln_pdf(x, y) - peak).collect())
            .collect()
    }

    /// Normalizing constant of the density at its mode,
    /// `1 / (2 pi sig_x sig_y sqrt(1 - rho^2))`.
    pub fn peak_density(&self) -> f64 {
        1.0 / (2.0 * PI * self.sigs[0] * self.sigs[1] * (1.0 - self.rho * self.rho).sqrt())
    }
}

impl ConditionalSampler for BivariateNormal {
    fn sample_y_given_x<R: Rng + ?Sized>(&self, x: f64, rng: &mut R) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        self.y_given_x(x) + self.csig_y * z
    }

    fn sample_x_given_y<R: Rng + ?Sized>(&self, y: f64, rng: &mut R) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        self.x_given_y(y) + self.csig_x * z
    }

    fn mean_point(&self) -> (f64, f64) {
        (self.means[0], self.means[1])
    }
}

/// Axis vectors for plotting a BVN.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    pub x: Array1,
    pub y: Array1,
}

fn linspace(lo: f64, hi: f64, n: usize) -> Array1 {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n).map(|i| lo + step * i as f64).collect()
        }
    }
}
