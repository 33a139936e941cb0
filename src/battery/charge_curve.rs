// battery/charge_curve.rs
// One-timestep diffusion of the cathode charge curve (Fick's second law, 1D)
//
// The update is a Gaussian smoothing of the curve with the driven boundary clamped to the
// applied potential. It approximates diffusion over one timestep; it is not a verified
// finite-difference scheme.

use std::ops::Range;

/// Number of standard deviations covered on each side of the kernel.
pub const KERNEL_SIGMAS: usize = 3;

/// Divisor applied to the cathode width to get the kernel standard deviation.
pub const SIGMA_DIVISOR: f64 = 10.0;

/// Diffusion model for a cathode of a given width.
#[derive(Clone, Debug)]
pub struct ChargeCurveModel {
    kernel: Vec<f64>,
}

impl ChargeCurveModel {
    pub fn new(cathode_width: usize) -> Self {
        let sigma = cathode_width as f64 / SIGMA_DIVISOR;
        Self {
            kernel: gaussian_kernel(sigma, kernel_half_width(cathode_width)),
        }
    }

    pub fn kernel(&self) -> &[f64] {
        &self.kernel
    }

    /// Advance `curve` by one timestep with index 0 clamped to `driving_potential`.
    ///
    /// The curve is extended with a zero run, a run of the driving potential (so the kernel
    /// sees a steady boundary instead of a step) and a mirrored copy of itself (a no-flux wall
    /// at the current collector). After convolving, only the input span is kept.
    pub fn update(&self, driving_potential: f64, curve: &[f64]) -> Vec<f64> {
        if curve.is_empty() {
            return Vec::new();
        }

        let mut y = curve.to_vec();
        y[0] = driving_potential;

        let k = self.kernel.len();
        let mut base = Vec::with_capacity(2 * k + 2 * y.len());
        base.extend(std::iter::repeat(0.0).take(k));
        base.extend(std::iter::repeat(driving_potential).take(k));
        base.extend_from_slice(&y);
        base.extend(y.iter().rev());

        let pad_len = 2 * k;
        convolve_same(&base, &self.kernel, pad_len..pad_len + y.len())
    }

    /// Net charge moved into the cathode by one update. Positive means charging.
    pub fn current_given(&self, driving_potential: f64, curve: &[f64]) -> f64 {
        let updated: f64 = self.update(driving_potential, curve).iter().sum();
        updated - curve.iter().sum::<f64>()
    }

    /// Open-circuit potential after one update, read one cell inside the clamped boundary.
    pub fn potential_given(&self, driving_potential: f64, curve: &[f64]) -> f64 {
        let updated = self.update(driving_potential, curve);
        read_ocp(&updated)
    }
}

/// Reads the externally observable potential off a curve.
///
/// Index 0 is the artificial clamp, so the reading comes from index 1. A single-cell curve has
/// nothing behind the clamp and reports its only value.
pub fn read_ocp(curve: &[f64]) -> f64 {
    curve
        .get(1)
        .or_else(|| curve.first())
        .copied()
        .unwrap_or(0.0)
}

/// Half-width `ceil(3 * W / 10)` of the kernel for cathode width `W`, in whole samples.
pub fn kernel_half_width(cathode_width: usize) -> usize {
    (KERNEL_SIGMAS * cathode_width + 9) / 10
}

/// Gaussian sampled at integer offsets `-half_width..=half_width`, normalised to sum to 1
/// so the truncated tails do not lose charge.
pub fn gaussian_kernel(sigma: f64, half_width: usize) -> Vec<f64> {
    if sigma <= 0.0 || half_width == 0 {
        return vec![1.0];
    }

    let half = half_width as isize;
    let raw: Vec<f64> = (-half..=half)
        .map(|x| {
            let x = x as f64;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|g| g / total).collect()
}

/// Centred ("same"-length) convolution of `signal` with an odd-length `kernel`, evaluated only
/// for output indices in `window`. Samples outside the signal count as zero.
pub fn convolve_same(signal: &[f64], kernel: &[f64], window: Range<usize>) -> Vec<f64> {
    let offset = kernel.len().saturating_sub(1) / 2;
    window
        .map(|i| {
            let t = i + offset;
            kernel
                .iter()
                .enumerate()
                .filter_map(|(j, weight)| {
                    t.checked_sub(j)
                        .and_then(|idx| signal.get(idx))
                        .map(|s| s * weight)
                })
                .sum()
        })
        .collect()
}
