//! Meter configuration: ADC front-end profiles and window policies.

use anyhow::ensure;

/// Turns ratio of the stock SCT-013-000 (100 A : 50 mA).
pub const DEFAULT_TURNS_RATIO: f64 = 2000.0;

/// Burden resistor found on the usual breakout boards, in ohms.
pub const DEFAULT_BURDEN_OHMS: f64 = 18.0;

/// Nominal mains frequency assumed until the caller says otherwise.
pub const DEFAULT_LINE_HZ: u32 = 50;

/// Electrical profile of the ADC front end: reference voltage and
/// conversion width. Pick one of the named profiles or build one with
/// [`AdcProfile::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcProfile {
    reference_voltage: f64,
    resolution_bits: u32,
}

impl AdcProfile {
    /// 5.0 V reference, 10-bit conversions (Uno/Nano/Mega class boards).
    pub const AVR: Self = Self {
        reference_voltage: 5.0,
        resolution_bits: 10,
    };

    /// 3.3 V reference, 12-bit conversions (ESP32 family).
    pub const ESP32: Self = Self {
        reference_voltage: 3.3,
        resolution_bits: 12,
    };

    pub fn new(reference_voltage: f64, resolution_bits: u32) -> Result<Self, anyhow::Error> {
        ensure!(
            reference_voltage > 0.0,
            "reference voltage must be positive, got {reference_voltage}"
        );
        ensure!(
            (1..=24).contains(&resolution_bits),
            "resolution must be between 1 and 24 bits, got {resolution_bits}"
        );
        Ok(Self {
            reference_voltage,
            resolution_bits,
        })
    }

    pub fn reference_voltage(&self) -> f64 {
        self.reference_voltage
    }

    pub fn resolution_bits(&self) -> u32 {
        self.resolution_bits
    }

    /// Number of distinct conversion values, e.g. 1024 for 10 bits.
    pub fn full_scale(&self) -> u32 {
        1 << self.resolution_bits
    }

    /// Resting point of a half-supply biased input, in counts.
    pub fn midpoint(&self) -> f64 {
        f64::from(self.full_scale() / 2)
    }
}

/// When an accumulation window is considered complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPolicy {
    /// Close the window after exactly this many samples.
    FixedCount(u32),
    /// Close the window once ten nominal line cycles have elapsed, per the
    /// meter's configured line frequency.
    #[default]
    CycleTime,
}
