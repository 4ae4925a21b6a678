use std::panic;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;

/// Log output settings for a service binary. File output is opt-in
/// through `FM_LOG_DIR`; without it everything goes to stdout.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub dir: Option<PathBuf>,
    /// Also run the default panic hook (stderr + backtrace) after a
    /// panic has been logged.
    pub include_backtrace: bool,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self {
            dir: std::env::var_os("FM_LOG_DIR").map(PathBuf::from),
            include_backtrace: std::env::var("FM_LOG_INCLUDE_BACKTRACE")
                .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

/// Initialize the tracing subscriber for `service` and route panics
/// through it. `RUST_LOG` controls filtering and defaults to `info`.
///
/// Returns the appender guard when file logging is active; the caller
/// holds it for the life of the process so buffered lines are flushed
/// on shutdown.
pub fn init(service: &'static str, config: &LogConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let guard = match daily_log_file(config, service) {
        Some((writer, guard)) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
            None
        }
    };

    route_panics_to_tracing(service, config.include_backtrace);
    guard
}

fn daily_log_file(config: &LogConfig, service: &str) -> Option<(NonBlocking, WorkerGuard)> {
    let dir = config.dir.clone()?;
    if let Err(err) = std::fs::create_dir_all(&dir) {
        // Subscriber is not up yet; this cannot go through tracing.
        eprintln!(
            "cannot create log directory {}: {err}; logging to stdout",
            dir.display()
        );
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{service}.log"));
    Some(tracing_appender::non_blocking(appender))
}

/// Panics would otherwise bypass the structured log stream entirely.
/// Installed once per process.
fn route_panics_to_tracing(service: &'static str, include_backtrace: bool) {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let default_hook = panic::take_hook();

        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()));
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".into());

            tracing::error!(
                service,
                location = location.as_deref().unwrap_or("unknown"),
                %message,
                "panic captured"
            );

            if include_backtrace {
                default_hook(info);
            }
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        static ENV_GUARD: Mutex<()> = Mutex::new(());
        let _guard = ENV_GUARD.lock().unwrap();

        let previous: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, value)| {
                let old = std::env::var(key).ok();
                match value {
                    Some(v) => unsafe { std::env::set_var(key, v) },
                    None => unsafe { std::env::remove_var(key) },
                }
                (key.to_string(), old)
            })
            .collect();

        f();

        for (key, old) in previous {
            match old {
                Some(v) => unsafe { std::env::set_var(&key, v) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }

    #[test]
    fn config_defaults_to_stdout_without_env() {
        with_env(
            &[("FM_LOG_DIR", None), ("FM_LOG_INCLUDE_BACKTRACE", None)],
            || {
                let config = LogConfig::from_env();
                assert!(config.dir.is_none());
                assert!(!config.include_backtrace);
            },
        );
    }

    #[test]
    fn config_reads_dir_and_backtrace_flag() {
        with_env(
            &[
                ("FM_LOG_DIR", Some("/tmp/fm-logs")),
                ("FM_LOG_INCLUDE_BACKTRACE", Some("TRUE")),
            ],
            || {
                let config = LogConfig::from_env();
                assert_eq!(config.dir.as_deref(), Some(std::path::Path::new("/tmp/fm-logs")));
                assert!(config.include_backtrace);
            },
        );
    }
}
