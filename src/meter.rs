use std::fmt::Display;

use anyhow::ensure;
use serde::Serialize;

use crate::adc::AnalogInput;
use crate::clock::Clock;
use crate::config::{
    AdcProfile, WindowPolicy, DEFAULT_BURDEN_OHMS, DEFAULT_LINE_HZ, DEFAULT_TURNS_RATIO,
};
use crate::filter::BiasFilter;

/// Samples a tare keeps the accelerated filter rate for.
const TARE_SAMPLE_BUDGET: u32 = 100;

/// Nominal line cycles spanned by a time-based window.
const CYCLES_PER_WINDOW: u32 = 10;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Serialize)]
pub enum TareState {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

impl Display for TareState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{self:?}"))
    }
}

/// Snapshot of the meter internals for telemetry and diagnostics.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MeterStatus {
    pub amps: f64,
    pub dc_offset: f64,
    pub window_samples: u32,
    pub tare: TareState,
}

/// True-RMS current meter for a CT sensor on a single-ended ADC input.
///
/// Raw counts come in biased around half the supply; an exponential moving
/// average follows that bias so it can be subtracted before squaring. The
/// squared samples accumulate until the active [`WindowPolicy`] closes the
/// window, at which point the RMS count is scaled by the reference voltage
/// and the sensor calibration into amps.
///
/// Windows can be filled two ways: blocking ([`read_amps`](Self::read_amps))
/// or one sample at a time from an external loop ([`update`](Self::update)).
/// Blocking reads accumulate on their own locals, so they can be interleaved
/// with a partially filled non-blocking window without corrupting it.
pub struct Sct013<A: AnalogInput, C: Clock> {
    adc: A,
    clock: C,
    profile: AdcProfile,
    line_hz: u32,
    policy: WindowPolicy,
    calibration: f64,
    bias: BiasFilter,
    sum_squares: f64,
    sample_count: u32,
    window_start_ms: u32,
    last_amps: f64,
    tare_remaining: u32,
    tare: TareState,
}

impl<A: AnalogInput, C: Clock> Sct013<A, C> {
    /// Builds a meter with the offset estimate resting at the profile
    /// midpoint, a unity calibration factor, and time-based windows at
    /// 50 Hz.
    pub fn new(adc: A, clock: C, profile: AdcProfile) -> Self {
        Self {
            adc,
            clock,
            profile,
            line_hz: DEFAULT_LINE_HZ,
            policy: WindowPolicy::default(),
            calibration: 1.0,
            bias: BiasFilter::new(profile.midpoint()),
            sum_squares: 0.0,
            sample_count: 0,
            window_start_ms: 0,
            last_amps: 0.0,
            tare_remaining: 0,
            tare: TareState::NotStarted,
        }
    }

    /// One-time setup: configures the analog input and applies the stock
    /// SCT-013-000 calibration (2000 turns into an 18 Ω burden).
    pub fn init(&mut self) {
        self.calibration = DEFAULT_TURNS_RATIO / DEFAULT_BURDEN_OHMS;
        self.adc.configure();
        log::info!("Current meter ready, calibration factor {:.2}", self.calibration);
    }

    /// Like [`init`](Self::init) for a non-stock sensor: explicit CT turns
    /// ratio and burden resistance in ohms. The input is only configured
    /// once the values pass validation.
    pub fn init_with(&mut self, turns_ratio: f64, burden_ohms: f64) -> Result<(), anyhow::Error> {
        self.set_calibration(turns_ratio, burden_ohms)?;
        self.adc.configure();
        log::info!("Current meter ready, calibration factor {:.2}", self.calibration);
        Ok(())
    }

    /// Derives the calibration factor from the sensor's physical
    /// parameters: CT turns ratio over burden resistance, in amps per volt.
    pub fn set_calibration(
        &mut self,
        turns_ratio: f64,
        burden_ohms: f64,
    ) -> Result<(), anyhow::Error> {
        ensure!(
            turns_ratio > 0.0,
            "turns ratio must be positive, got {turns_ratio}"
        );
        ensure!(
            burden_ohms > 0.0,
            "burden resistance must be positive, got {burden_ohms}"
        );
        self.calibration = turns_ratio / burden_ohms;
        Ok(())
    }

    /// Sets the amps-per-volt multiplier directly.
    pub fn set_calibration_factor(&mut self, factor: f64) -> Result<(), anyhow::Error> {
        ensure!(
            factor > 0.0,
            "calibration factor must be positive, got {factor}"
        );
        self.calibration = factor;
        Ok(())
    }

    pub fn calibration_factor(&self) -> f64 {
        self.calibration
    }

    /// Nominal mains frequency used to size time-based windows.
    pub fn set_line_frequency(&mut self, hz: u32) -> Result<(), anyhow::Error> {
        ensure!(hz > 0, "line frequency must be positive");
        self.line_hz = hz;
        Ok(())
    }

    pub fn line_frequency(&self) -> u32 {
        self.line_hz
    }

    /// Selects how non-blocking windows terminate. Switching policies
    /// discards any partially filled window.
    pub fn set_policy(&mut self, policy: WindowPolicy) {
        if policy != self.policy {
            self.discard_window();
            self.policy = policy;
        }
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    /// Feeds one sample into the open window. Returns `true` when that
    /// sample completed the window and [`last_amps`](Self::last_amps) was
    /// refreshed.
    ///
    /// While a tare is converging the offset filter runs at its accelerated
    /// rate; the tare budget only drains through this method, never through
    /// blocking reads.
    pub fn update(&mut self) -> bool {
        let raw = f64::from(self.adc.read_sample());
        let filtered = if self.tare_remaining > 0 {
            let filtered = self.bias.track_fast(raw);
            self.tare_remaining -= 1;
            if self.tare_remaining == 0 {
                self.tare = TareState::Complete;
                log::debug!(
                    "Tare complete, offset settled at {:.1} counts",
                    self.bias.estimate()
                );
            }
            filtered
        } else {
            self.bias.track(raw)
        };

        let first = self.sample_count == 0;
        self.sum_squares += filtered * filtered;
        self.sample_count += 1;

        let complete = match self.policy {
            WindowPolicy::FixedCount(target) => self.sample_count >= target,
            WindowPolicy::CycleTime => {
                let now = self.clock.now_ms();
                if first {
                    self.window_start_ms = now;
                }
                now.wrapping_sub(self.window_start_ms) >= self.window_ms()
            }
        };

        if complete {
            self.last_amps = self.window_amps(self.sum_squares, self.sample_count);
            log::trace!(
                "Window closed: {} samples, {:.3} A",
                self.sample_count,
                self.last_amps
            );
            self.discard_window();
        }
        complete
    }

    /// Runs one complete measurement with the configured policy, blocking
    /// until the window fills, and returns the fresh RMS value in amps.
    pub fn read_amps(&mut self) -> f64 {
        self.read_amps_with(self.policy)
    }

    /// Blocking measurement with an explicit policy. Accumulation runs on
    /// locals, so a window opened through [`update`](Self::update) stays
    /// untouched; only the shared offset estimate advances, at its normal
    /// rate.
    pub fn read_amps_with(&mut self, policy: WindowPolicy) -> f64 {
        let mut sum_squares = 0.0;
        let mut samples: u32 = 0;

        match policy {
            WindowPolicy::FixedCount(target) => {
                while samples < target {
                    let filtered = self.filtered_sample();
                    sum_squares += filtered * filtered;
                    samples += 1;
                }
            }
            WindowPolicy::CycleTime => {
                let duration = self.window_ms();
                let start = self.clock.now_ms();
                while self.clock.now_ms().wrapping_sub(start) < duration {
                    let filtered = self.filtered_sample();
                    sum_squares += filtered * filtered;
                    samples += 1;
                }
            }
        }

        self.window_amps(sum_squares, samples)
    }

    /// Result of the most recent completed window, in amps. Stays 0.0
    /// until the first window closes and stale until the next one does.
    pub fn last_amps(&self) -> f64 {
        self.last_amps
    }

    /// Current DC offset estimate, in ADC counts.
    pub fn dc_offset(&self) -> f64 {
        self.bias.estimate()
    }

    /// Re-zeroes the DC offset: the next 100 samples fed through
    /// [`update`](Self::update) run the filter at the accelerated rate.
    /// Any partially filled window is discarded so no reading mixes the
    /// two convergence rates.
    pub fn tare(&mut self) {
        self.tare_remaining = TARE_SAMPLE_BUDGET;
        self.tare = TareState::InProgress;
        self.discard_window();
        log::info!("Tare started, re-zeroing over {} samples", TARE_SAMPLE_BUDGET);
    }

    /// `true` once no tare is converging. Also `true` before the first
    /// tare; [`tare_state`](Self::tare_state) tells the two apart.
    pub fn tare_complete(&self) -> bool {
        self.tare_remaining == 0
    }

    pub fn tare_state(&self) -> TareState {
        self.tare
    }

    pub fn status(&self) -> MeterStatus {
        MeterStatus {
            amps: self.last_amps,
            dc_offset: self.bias.estimate(),
            window_samples: self.sample_count,
            tare: self.tare,
        }
    }

    fn filtered_sample(&mut self) -> f64 {
        let raw = f64::from(self.adc.read_sample());
        self.bias.track(raw)
    }

    /// Duration of a time-based window: ten nominal line cycles in integer
    /// milliseconds, 200 ms at 50 Hz and 160 ms at 60 Hz.
    fn window_ms(&self) -> u32 {
        (1000 / self.line_hz) * CYCLES_PER_WINDOW
    }

    fn window_amps(&self, sum_squares: f64, samples: u32) -> f64 {
        if samples == 0 {
            return 0.0;
        }
        let rms_counts = (sum_squares / f64::from(samples)).sqrt();
        rms_counts / f64::from(self.profile.full_scale())
            * self.profile.reference_voltage()
            * self.calibration
    }

    fn discard_window(&mut self) {
        self.sum_squares = 0.0;
        self.sample_count = 0;
    }
}
