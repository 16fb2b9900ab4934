//! DC-offset tracking and smoothing helpers.

// Per-sample divisors for the offset estimate. The slow rate stays well
// below the line frequency so the AC content passes through unattenuated;
// the fast rate is only used while a tare is converging.
const TRACK_DIVISOR: f64 = 1024.0;
const TARE_DIVISOR: f64 = 4.0;

/// Exponential moving average that follows the DC component of the raw ADC
/// signal so it can be subtracted before squaring.
#[derive(Debug, Clone, Copy)]
pub struct BiasFilter {
    estimate: f64,
}

impl BiasFilter {
    /// Starts the estimate at `initial`, normally half the ADC full scale.
    pub fn new(initial: f64) -> Self {
        Self { estimate: initial }
    }

    /// Current offset estimate, in ADC counts.
    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    /// Folds one raw sample at the steady-state rate and returns it with
    /// the offset removed.
    pub fn track(&mut self, raw: f64) -> f64 {
        self.apply(raw, TRACK_DIVISOR)
    }

    /// Like [`track`](Self::track) but converging 256 times faster. Eats
    /// into the AC content, so only useful while re-zeroing.
    pub fn track_fast(&mut self, raw: f64) -> f64 {
        self.apply(raw, TARE_DIVISOR)
    }

    fn apply(&mut self, raw: f64, divisor: f64) -> f64 {
        self.estimate += (raw - self.estimate) / divisor;
        raw - self.estimate
    }
}

/// Weighted blend of a new reading into an old one. `weight` is the share
/// kept from the old value: 0.9 smooths heavily, 0.1 barely. Useful for
/// stabilizing successive readings on a display; the meter itself never
/// calls it.
pub fn smooth(new_value: f64, old_value: f64, weight: f64) -> f64 {
    old_value * weight + new_value * (1.0 - weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtracts_the_updated_estimate() {
        let mut bias = BiasFilter::new(512.0);
        let filtered = bias.track(612.0);

        // The estimate moves by 1/1024 of the error before the subtraction.
        let expected_estimate = 512.0 + 100.0 / 1024.0;
        assert!((bias.estimate() - expected_estimate).abs() < 1e-12);
        assert!((filtered - (612.0 - expected_estimate)).abs() < 1e-12);
    }

    #[test]
    fn tracks_a_constant_input() {
        let mut bias = BiasFilter::new(512.0);
        for _ in 0..5000 {
            bias.track(800.0);
        }
        assert!(
            (bias.estimate() - 800.0).abs() < 5.0,
            "estimate stuck at {}",
            bias.estimate()
        );
    }

    #[test]
    fn fast_rate_converges_within_the_tare_budget() {
        let mut slow = BiasFilter::new(512.0);
        let mut fast = BiasFilter::new(512.0);
        for _ in 0..100 {
            slow.track(800.0);
            fast.track_fast(800.0);
        }

        let slow_error = (slow.estimate() - 800.0).abs();
        let fast_error = (fast.estimate() - 800.0).abs();
        assert!(fast_error < 1.0, "fast tracker still {fast_error} away");
        assert!(
            slow_error > 100.0,
            "slow tracker should not have covered the distance yet ({slow_error})"
        );
    }

    #[test]
    fn smooth_blends_by_weight() {
        assert_eq!(smooth(10.0, 20.0, 1.0), 20.0);
        assert_eq!(smooth(10.0, 20.0, 0.0), 10.0);
        assert!((smooth(10.0, 20.0, 0.9) - 19.0).abs() < 1e-12);
    }
}
