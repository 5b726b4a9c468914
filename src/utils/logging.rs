use env_logger::{Builder, Env};
use log::SetLoggerError;

/// Initializes the global logger, honoring `RUST_LOG` and defaulting to `info`.
pub fn init_logger() -> Result<(), SetLoggerError> {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init()
}
