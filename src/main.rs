use std::error::Error;
use std::f64::consts::{SQRT_2, TAU};
use std::thread::sleep;
use std::time::{Duration, Instant};

use log::LevelFilter;
use sct013::config::{DEFAULT_BURDEN_OHMS, DEFAULT_TURNS_RATIO};
use sct013::{logger, AdcProfile, AnalogInput, Sct013, StdClock, WindowPolicy};

const LINE_HZ: f64 = 50.0;

/// 50 Hz mains seen through a 10-bit front end, for running the meter on a
/// host. Conversion time is modeled with a short sleep, giving roughly
/// 10 kSa/s like a real one-shot converter.
struct MainsSim {
    started: Instant,
    amplitude: f64,
    bias: f64,
}

impl MainsSim {
    /// Simulates `rms_amps` of load current through the stock sensor, with
    /// the front end divider resting at `bias` counts.
    fn with_load(rms_amps: f64, bias: f64) -> Self {
        let amps_per_count = AdcProfile::AVR.reference_voltage()
            / f64::from(AdcProfile::AVR.full_scale())
            * (DEFAULT_TURNS_RATIO / DEFAULT_BURDEN_OHMS);
        Self {
            started: Instant::now(),
            amplitude: rms_amps / amps_per_count * SQRT_2,
            bias,
        }
    }
}

impl AnalogInput for MainsSim {
    fn read_sample(&mut self) -> u32 {
        sleep(Duration::from_micros(100));
        let t = self.started.elapsed().as_secs_f64();
        let level = self.bias + self.amplitude * (TAU * LINE_HZ * t).sin();
        level.round().clamp(0.0, 1023.0) as u32
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    logger::init(LevelFilter::Debug)?;

    // An 8.5 A load behind a divider sitting 30 counts above midpoint, the
    // kind of offset resistor tolerances produce.
    let signal = MainsSim::with_load(8.5, 542.0);
    let mut meter = Sct013::new(signal, StdClock::new(), AdcProfile::AVR);
    meter.init();

    // Blocking read over ten line cycles of wall time.
    let amps = meter.read_amps();
    log::info!("Blocking cycle-time read: {amps:.2} A");

    // Non-blocking: poll one sample per iteration, re-zero after the
    // second window. The early readings run high until the offset estimate
    // reaches the divider bias; the tare gets it there in 100 samples.
    meter.set_policy(WindowPolicy::FixedCount(2000));
    let mut windows = 0;
    while windows < 5 {
        if meter.update() {
            windows += 1;
            let status = meter.status();
            log::info!("Window {}: {:.2} A", windows, status.amps);
            println!("{}", serde_json::to_string(&status)?);
            if windows == 2 {
                meter.tare();
            }
        }
    }

    Ok(())
}
