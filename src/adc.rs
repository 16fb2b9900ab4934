use std::fmt::Debug;
use std::marker::PhantomData;

use embedded_hal::adc::{Channel, OneShot};

#[cfg(test)]
use mockall::automock;

/// Single-ended sample source feeding the meter.
///
/// `read_sample` is expected to complete quickly and deterministically
/// relative to the line frequency, returning raw counts in
/// `[0, 2^resolution)`.
#[cfg_attr(test, automock)]
pub trait AnalogInput {
    /// One-time input setup, invoked once from `Sct013::init`. Defaults to
    /// a no-op for sources that are ready at construction.
    fn configure(&mut self) {}

    /// Runs one conversion and returns the raw count.
    fn read_sample(&mut self) -> u32;
}

/// Adapter exposing any `embedded-hal` one-shot ADC as an [`AnalogInput`].
///
/// Unfinished conversions are retried; a failed conversion holds the
/// previous sample so a flaky converter degrades the reading instead of
/// halting the sampling loop.
pub struct OneShotInput<Adc, Word, Pin, Driver> {
    driver: Driver,
    pin: Pin,
    last_sample: u32,
    _adc: PhantomData<(Adc, Word)>,
}

impl<Adc, Word, Pin, Driver> OneShotInput<Adc, Word, Pin, Driver>
where
    Driver: OneShot<Adc, Word, Pin>,
    Pin: Channel<Adc>,
    Word: Into<u32>,
{
    pub fn new(driver: Driver, pin: Pin) -> Self {
        Self {
            driver,
            pin,
            last_sample: 0,
            _adc: PhantomData,
        }
    }

    /// Releases the underlying driver and pin.
    pub fn free(self) -> (Driver, Pin) {
        (self.driver, self.pin)
    }
}

impl<Adc, Word, Pin, Driver> AnalogInput for OneShotInput<Adc, Word, Pin, Driver>
where
    Driver: OneShot<Adc, Word, Pin>,
    Driver::Error: Debug,
    Pin: Channel<Adc>,
    Word: Into<u32>,
{
    fn read_sample(&mut self) -> u32 {
        loop {
            match self.driver.read(&mut self.pin) {
                Ok(word) => {
                    self.last_sample = word.into();
                    return self.last_sample;
                }
                Err(nb::Error::WouldBlock) => continue,
                Err(nb::Error::Other(err)) => {
                    log::warn!("ADC conversion failed, holding previous sample: {err:?}");
                    return self.last_sample;
                }
            }
        }
    }
}
