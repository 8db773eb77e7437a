use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. Returns `false` if a subscriber
/// was already installed.
pub fn init_logging(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_reports_false() {
        init_logging("debug");
        assert!(!init_logging("info"));
    }
}
