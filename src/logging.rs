//! Tracing bootstrap for binaries and demos embedding the sync layer.

use std::env;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,pawhub_sync=debug";

/// Installs a global `fmt` subscriber. Does nothing if one is already set.
///
/// Filter precedence:
/// 1) `RUST_LOG`
/// 2) `PAWHUB_LOG`
/// 3) internal default filter
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(filter_from(|key| env::var(key).ok()))
        .try_init();
}

fn filter_from(lookup: impl Fn(&str) -> Option<String>) -> EnvFilter {
    for key in [EnvFilter::DEFAULT_ENV, "PAWHUB_LOG"] {
        if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty())
            && let Ok(filter) = EnvFilter::try_new(value)
        {
            return filter;
        }
    }
    EnvFilter::new(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_wins() {
        let filter = filter_from(|key| match key {
            "RUST_LOG" => Some("warn".to_string()),
            "PAWHUB_LOG" => Some("trace".to_string()),
            _ => None,
        });
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_blank_values_fall_through() {
        let filter = filter_from(|key| match key {
            "RUST_LOG" => Some("  ".to_string()),
            "PAWHUB_LOG" => Some("pawhub_sync=trace".to_string()),
            _ => None,
        });
        assert_eq!(filter.to_string(), "pawhub_sync=trace");

        assert_eq!(
            filter_from(|_| None).to_string(),
            EnvFilter::new(DEFAULT_FILTER).to_string()
        );
    }
}
