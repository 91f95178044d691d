//! Closed-form hydraulic model: demand flow, upstream pressure, and friction loss.
//!
//! Every function here is deterministic apart from an explicit noise term
//! drawn from a caller-supplied [`Rng`]. Passing a noise amplitude of `0.0`
//! draws nothing, which makes the profile functions exactly reproducible.

use std::f64::consts::PI;

use rand::Rng;

/// Lower bound on the noise-free demand flow (l/s).
pub const MIN_FLOW_LPS: f64 = 2.0;

/// Reference noise amplitude on flow (l/s).
pub const FLOW_NOISE_LPS: f64 = 0.25;

/// Reference noise amplitude on the simulated inlet pressure (m).
pub const INLET_NOISE_M: f64 = 1.5;

/// Amplitude of the diurnal inlet swing (m).
const INLET_SWING_M: f64 = 12.0;

/// Hour at which upstream pressure peaks (low overnight demand on the trunk main).
const INLET_PEAK_HOUR: f64 = 3.0;

/// A Gaussian-shaped demand peak.
struct DemandPeak {
    center_hour: f64,
    width: f64,
    amplitude_lps: f64,
}

/// Morning and evening residential peaks.
const DEMAND_PEAKS: [DemandPeak; 2] = [
    DemandPeak {
        center_hour: 8.0,
        width: 2.0,
        amplitude_lps: 25.0,
    },
    DemandPeak {
        center_hour: 20.0,
        width: 2.2,
        amplitude_lps: 18.0,
    },
];

/// Draws uniform noise in `[-amplitude, +amplitude]`.
///
/// Returns `0.0` without touching the generator when `amplitude <= 0.0`.
pub fn uniform_noise(rng: &mut impl Rng, amplitude: f64) -> f64 {
    if amplitude <= 0.0 || !amplitude.is_finite() {
        return 0.0;
    }
    rng.random_range(-amplitude..=amplitude)
}

/// Noise-free residential demand at `hour`, in liters per second.
///
/// A sinusoidal base `5 + 3 sin(hπ/12)` plus peaks at 08:00 and 20:00,
/// floored at [`MIN_FLOW_LPS`].
pub fn flow_profile(hour: u32) -> f64 {
    let h = f64::from(hour);
    let base = 5.0 + 3.0 * (h * PI / 12.0).sin();
    let peaks: f64 = DEMAND_PEAKS
        .iter()
        .map(|p| {
            let z = (h - p.center_hour) / p.width;
            p.amplitude_lps * (-0.5 * z * z).exp()
        })
        .sum();
    (base + peaks).max(MIN_FLOW_LPS)
}

/// Demand flow at `hour` with additive uniform noise of `noise_lps`.
///
/// The result is at least `MIN_FLOW_LPS - noise_lps`.
pub fn flow_at(hour: u32, noise_lps: f64, rng: &mut impl Rng) -> f64 {
    flow_profile(hour) + uniform_noise(rng, noise_lps)
}

/// Noise-free upstream pressure: highest near 03:00, lowest near 15:00.
pub fn inlet_profile(hour: u32, base_inlet_m: f64) -> f64 {
    let h = f64::from(hour);
    base_inlet_m + INLET_SWING_M * ((h - INLET_PEAK_HOUR) * PI / 12.0).cos()
}

/// Simulated upstream pressure at `hour` with uniform noise of `noise_m`.
pub fn dynamic_inlet(hour: u32, base_inlet_m: f64, noise_m: f64, rng: &mut impl Rng) -> f64 {
    inlet_profile(hour, base_inlet_m) + uniform_noise(rng, noise_m)
}

/// Friction head loss between the valve and the critical point: `k * Q^2`.
pub fn head_loss(flow_lps: f64, friction_coefficient: f64) -> f64 {
    friction_coefficient * flow_lps * flow_lps
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn flow_peaks_in_morning_and_evening() {
        let morning = flow_profile(8);
        let evening = flow_profile(20);
        let night = flow_profile(3);
        assert!(morning > 30.0, "morning peak was {morning}");
        assert!(evening > night);
        assert!(morning > evening);
    }

    #[test]
    fn flow_profile_never_below_floor() {
        for h in 0..24 {
            assert!(flow_profile(h) >= MIN_FLOW_LPS);
        }
    }

    #[test]
    fn noisy_flow_stays_within_noise_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for h in 0..24 {
            for _ in 0..50 {
                let q = flow_at(h, FLOW_NOISE_LPS, &mut rng);
                assert!(q >= MIN_FLOW_LPS - FLOW_NOISE_LPS);
                assert!((q - flow_profile(h)).abs() <= FLOW_NOISE_LPS);
            }
        }
    }

    #[test]
    fn zero_noise_is_exact() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(flow_at(8, 0.0, &mut rng), flow_profile(8));
        assert_eq!(dynamic_inlet(15, 65.0, 0.0, &mut rng), inlet_profile(15, 65.0));
    }

    #[test]
    fn inlet_peaks_at_three_and_troughs_at_fifteen() {
        assert!((inlet_profile(3, 65.0) - 77.0).abs() < 1e-9);
        assert!((inlet_profile(15, 65.0) - 53.0).abs() < 1e-9);
        for h in 0..24 {
            let p = inlet_profile(h, 65.0);
            assert!((53.0 - 1e-9..=77.0 + 1e-9).contains(&p));
        }
    }

    #[test]
    fn noisy_inlet_stays_within_band() {
        let mut rng = StdRng::seed_from_u64(3);
        for h in 0..24 {
            let p = dynamic_inlet(h, 65.0, INLET_NOISE_M, &mut rng);
            assert!((p - inlet_profile(h, 65.0)).abs() <= INLET_NOISE_M);
        }
    }

    #[test]
    fn head_loss_is_zero_without_flow() {
        assert_eq!(head_loss(0.0, 0.045), 0.0);
    }

    #[test]
    fn head_loss_grows_with_flow() {
        assert!(head_loss(10.0, 0.045) < head_loss(20.0, 0.045));
        assert!((head_loss(10.0, 0.045) - 4.5).abs() < 1e-12);
    }
}
