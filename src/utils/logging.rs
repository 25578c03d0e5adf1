//! Logging setup.
//!
//! `RUST_LOG` wins when set. Otherwise the default level is `Info`, or
//! `Debug` when `SHORTLIST_DEBUG` is `1`/`true`. Logs go to stderr; stdout is
//! reserved for host events.

use log::LevelFilter;

pub const ENV_DEBUG: &str = "SHORTLIST_DEBUG";

pub fn debug_enabled(value: Option<&str>) -> bool {
    value
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn default_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

pub fn init() {
    let debug = debug_enabled(std::env::var(ENV_DEBUG).ok().as_deref());

    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level(debug));
    builder.parse_default_env();

    if builder.try_init().is_err() {
        log::debug!("logger already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_values() {
        assert!(debug_enabled(Some("1")));
        assert!(debug_enabled(Some("TRUE")));
        assert!(!debug_enabled(Some("0")));
        assert!(!debug_enabled(None));
        assert_eq!(default_level(true), LevelFilter::Debug);
        assert_eq!(default_level(false), LevelFilter::Info);
    }
}
