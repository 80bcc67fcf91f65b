//! Box-filter smoothing as a fast Gaussian approximation.
//!
//! A uniform `w × w` kernel with `w = sqrt(12σ² + 1)` has the variance of a
//! Gaussian with standard deviation σ. The convolution is computed in the
//! frequency domain, so its cost does not depend on the window size.
//!
//! Boundaries wrap around (circular convolution). Only a border of about
//! `w / 2` pixels is affected.

use heatmap_common::Grid;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Box window width approximating a Gaussian of `sigma` pixels.
pub fn box_width_for_sigma(sigma: f64) -> usize {
    ((12.0 * sigma * sigma + 1.0).sqrt().floor() as usize).max(1)
}

/// Convolve `field` with a normalized `window × window` box kernel.
///
/// The kernel is centred on each cell, so the result is not shifted.
/// A window of 0 or 1 returns the field unchanged.
pub fn smooth(field: &Grid, window: usize) -> Grid {
    let (width, height) = field.shape();
    if window <= 1 || width == 0 || height == 0 {
        return field.clone();
    }

    let fft = Fft2d::new(width, height);

    let mut spectrum: Vec<Complex<f64>> = field
        .data()
        .iter()
        .map(|&v| Complex::new(v, 0.0))
        .collect();
    let mut kernel = box_kernel(width, height, window);

    fft.forward(&mut spectrum);
    fft.forward(&mut kernel);

    for (s, k) in spectrum.iter_mut().zip(kernel.iter()) {
        *s *= *k;
    }

    fft.inverse(&mut spectrum);

    let norm = 1.0 / (width * height) as f64;
    let mut out = Grid::zeros(width, height);
    for (dst, c) in out.data_mut().iter_mut().zip(spectrum.iter()) {
        *dst = c.re * norm;
    }
    out
}

/// Box kernel laid out with its centre at the origin, wrapping negative
/// offsets to the far edges.
fn box_kernel(width: usize, height: usize, window: usize) -> Vec<Complex<f64>> {
    let mut kernel = vec![Complex::new(0.0, 0.0); width * height];
    let weight = 1.0 / (window * window) as f64;

    let start = -((window / 2) as i64);
    let end = start + window as i64;

    for dy in start..end {
        let row = dy.rem_euclid(height as i64) as usize;
        for dx in start..end {
            let col = dx.rem_euclid(width as i64) as usize;
            kernel[row * width + col].re += weight;
        }
    }

    kernel
}

/// 2-D FFT via row-column decomposition.
struct Fft2d {
    width: usize,
    height: usize,
    row_forward: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl Fft2d {
    fn new(width: usize, height: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            width,
            height,
            row_forward: planner.plan_fft_forward(width),
            col_forward: planner.plan_fft_forward(height),
            row_inverse: planner.plan_fft_inverse(width),
            col_inverse: planner.plan_fft_inverse(height),
        }
    }

    fn forward(&self, data: &mut [Complex<f64>]) {
        self.process(data, &self.row_forward, &self.col_forward);
    }

    /// Unnormalized inverse transform.
    fn inverse(&self, data: &mut [Complex<f64>]) {
        self.process(data, &self.row_inverse, &self.col_inverse);
    }

    fn process(
        &self,
        data: &mut [Complex<f64>],
        rows: &Arc<dyn Fft<f64>>,
        cols: &Arc<dyn Fft<f64>>,
    ) {
        // Buffer length is a multiple of the FFT length, so every row is
        // transformed in one call.
        rows.process(data);

        let mut transposed = transpose(data, self.width, self.height);
        cols.process(&mut transposed);

        let restored = transpose(&transposed, self.height, self.width);
        data.copy_from_slice(&restored);
    }
}

/// Transpose a row-major `width × height` buffer.
fn transpose(data: &[Complex<f64>], width: usize, height: usize) -> Vec<Complex<f64>> {
    let mut out = vec![Complex::new(0.0, 0.0); data.len()];
    for y in 0..height {
        for x in 0..width {
            out[x * height + y] = data[y * width + x];
        }
    }
    out
}
