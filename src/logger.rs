use log::{LevelFilter, Log};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Timestamped console logger for hosted targets.
#[derive(Default)]
pub struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        println!("{}", format_record(record));
    }

    fn flush(&self) {}
}

/// Installs the console logger as the global sink. Fails if another logger
/// was installed first.
pub fn init(level: LevelFilter) -> Result<(), anyhow::Error> {
    log::set_boxed_logger(Box::new(ConsoleLogger))?;
    log::set_max_level(level);
    Ok(())
}

fn format_record(record: &log::Record) -> String {
    format!(
        "{} [{}:{}] {}",
        OffsetDateTime::now_utc().format(&Rfc3339).unwrap(),
        record.level(),
        record.target(),
        record.args()
    )
}
