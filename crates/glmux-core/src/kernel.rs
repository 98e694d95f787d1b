//! Discrete Gaussian convolution kernels.

use std::f64::consts::PI;

use tracing::trace;

/// Tunables for kernel synthesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelParams {
    /// Sampling stops once a weight drops to this value or below.
    pub cutoff: f32,
    /// Hard cap on samples taken on one side of the center (center included).
    pub max_samples: usize,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            cutoff: 0.005,
            max_samples: 1024,
        }
    }
}

impl KernelParams {
    /// Widest kernel these parameters can produce. The last sample taken
    /// is never part of the kernel, even when the cap stops sampling.
    pub fn max_kernel_width(&self) -> usize {
        (2 * self.max_samples.saturating_sub(1)).saturating_sub(1).max(1)
    }
}

/// Padding a blur of `std_dev` needs around its source.
pub fn blur_kernel_radius(std_dev: f32) -> i32 {
    (f64::from(std_dev) * 3.0).ceil() as i32
}

/// Gaussian kernel with the default [`KernelParams`].
pub fn compute_kernel(std_dev: f32, opacity: f32) -> Vec<f32> {
    compute_kernel_with(&KernelParams::default(), std_dev, opacity)
}

/// Symmetric Gaussian kernel whose weights sum to `opacity`.
///
/// The result always has odd length with its peak in the middle.
pub fn compute_kernel_with(params: &KernelParams, std_dev: f32, opacity: f32) -> Vec<f32> {
    assert!(std_dev >= 0.0, "negative standard deviation {std_dev}");
    if std_dev == 0.0 {
        return vec![opacity];
    }

    let sigma = f64::from(std_dev);
    let opacity = f64::from(opacity);
    let cutoff = f64::from(params.cutoff);
    let max_samples = params.max_samples.max(1);
    let norm = 1.0 / (2.0 * PI * sigma * sigma).sqrt();

    let mut half = Vec::new();
    for i in 0..max_samples {
        let x = i as f64;
        let coeff = (-x * x / (2.0 * sigma * sigma)).exp() * norm * opacity;
        half.push(coeff);
        if coeff <= cutoff {
            break;
        }
    }
    // The last sample taken, below cutoff or at the cap, is dropped.
    half.pop();
    if half.is_empty() {
        // Even the center is below cutoff.
        half.push(norm * opacity);
    }

    let center = half.len() - 1;
    let mut kernel = Vec::with_capacity(2 * center + 1);
    kernel.extend(half.iter().rev());
    kernel.extend(half.iter().skip(1));

    let sum: f64 = kernel.iter().sum();
    let scale = if sum == 0.0 { 1.0 } else { opacity / sum };
    let kernel: Vec<f32> = kernel.iter().map(|w| (w * scale) as f32).collect();

    trace!(
        std_dev,
        width = kernel.len(),
        sum = kernel.iter().map(|w| f64::from(*w)).sum::<f64>(),
        "kernel: {kernel:?}"
    );
    kernel
}
