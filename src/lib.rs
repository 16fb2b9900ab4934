//! True-RMS current metering for SCT-013 style split-core current
//! transformers read through a single-ended ADC.
//!
//! The signal chain is deliberately small: an exponential moving average
//! tracks the DC bias the front end injects, the bias-free samples are
//! squared and accumulated over a measurement window, and the window's RMS
//! count is scaled into amps by the ADC profile and the sensor calibration.
//! Windows close either after a fixed sample count or after ten nominal
//! line cycles of wall time.
//!
//! Hardware comes in through two one-method traits, [`AnalogInput`] and
//! [`Clock`], so the meter runs the same on an MCU, on a host, or against
//! mocks. An [`adc::OneShotInput`] adapter covers any `embedded-hal`
//! one-shot converter.
//!
//! ```no_run
//! use sct013::{AdcProfile, Sct013, StdClock, WindowPolicy};
//! # struct Sim;
//! # impl sct013::AnalogInput for Sim {
//! #     fn read_sample(&mut self) -> u32 { 512 }
//! # }
//!
//! let mut meter = Sct013::new(Sim, StdClock::new(), AdcProfile::AVR);
//! meter.init();
//! let amps = meter.read_amps_with(WindowPolicy::FixedCount(1000));
//! ```

pub mod adc;
pub mod clock;
pub mod config;
pub mod filter;
pub mod logger;
pub mod meter;

pub use adc::AnalogInput;
pub use clock::{Clock, StdClock};
pub use config::{AdcProfile, WindowPolicy};
pub use filter::smooth;
pub use meter::{MeterStatus, Sct013, TareState};
