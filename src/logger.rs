use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::LazyLock;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Default log file used by `--log`
pub const DEFAULT_LOG_FILE: &str = "glu-debug.log";

/// Targets that only log when `GLU_VERBOSE` is set
const NOISY_TARGETS: &[&str] = &["reqwest", "hyper", "h2", "rustls", "want", "mio"];

#[derive(Default)]
struct LogState {
    enabled: bool,
    verbose: bool,
    file: Option<File>,
}

impl LogState {
    fn write_line(&mut self, bytes: &[u8]) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.write_all(bytes);
            let _ = file.flush();
        }
    }
}

static STATE: LazyLock<Mutex<LogState>> = LazyLock::new(|| Mutex::new(LogState::default()));

/// Whether a record from `target` at `level` is written
fn admits(enabled: bool, verbose: bool, target: &str, level: Level) -> bool {
    if !enabled {
        return false;
    }
    if target.starts_with("glu") {
        return level <= Level::Debug;
    }
    if !verbose && NOISY_TARGETS.iter().any(|noisy| target.starts_with(noisy)) {
        return false;
    }
    level <= Level::Info
}

struct GluLogger;

static LOGGER: GluLogger = GluLogger;

impl log::Log for GluLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let state = STATE.lock();
        admits(state.enabled, state.verbose, metadata.target(), metadata.level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "{} {} [{}] - {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        );
        STATE.lock().write_line(line.as_bytes());
    }

    fn flush(&self) {}
}

/// Sink for the tracing fmt layer; span events go to the same file as log records
#[derive(Clone, Copy)]
struct SpanWriter;

impl Write for SpanWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = STATE.lock();
        if state.enabled {
            state.write_line(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> fmt::MakeWriter<'a> for SpanWriter {
    type Writer = SpanWriter;

    fn make_writer(&'a self) -> Self::Writer {
        *self
    }
}

/// Install the `log` and `tracing` pipelines. Later calls return the first call's outcome.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::OnceLock;
    static INIT_RESULT: OnceLock<Result<(), String>> = OnceLock::new();

    let result = INIT_RESULT.get_or_init(|| {
        let verbose = std::env::var_os("GLU_VERBOSE").is_some()
            || std::env::var("RUST_LOG").is_ok_and(|v| v.contains("debug") || v.contains("trace"));
        STATE.lock().verbose = verbose;

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "glu=debug,warn".into());
        let span_layer = fmt::Layer::new()
            .with_target(true)
            .with_ansi(false)
            .with_timer(fmt::time::ChronoUtc::rfc_3339())
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(SpanWriter);

        let tracing_result = Registry::default()
            .with(env_filter)
            .with(span_layer)
            .try_init();
        let log_result = log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Debug));

        match (tracing_result, log_result) {
            (_, Ok(())) | (Ok(()), Err(_)) => Ok(()),
            (Err(tracing_err), Err(log_err)) => Err(format!(
                "Failed to initialize logging: tracing={tracing_err}, log={log_err}"
            )),
        }
    });

    result.clone().map_err(Into::into)
}

pub fn enable_logging() {
    STATE.lock().enabled = true;
}

pub fn disable_logging() {
    STATE.lock().enabled = false;
}

/// Append log output to `file_path`, creating it if needed
pub fn set_log_file(file_path: &str) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)?;
    STATE.lock().file = Some(file);
    Ok(())
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}
