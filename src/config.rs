// ⚙️ Config - server settings from the command line

use std::time::Duration;

use clap::Parser;

use crate::query::DEFAULT_PAGE_SIZE;
use crate::retry::RetryPolicy;

#[derive(Parser, Debug, Clone)]
#[command(name = "address-book-server")]
#[command(about = "In-memory address book REST API")]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// Number of random entities to load at startup
    #[arg(long, default_value_t = 10)]
    pub seed: usize,

    /// Page size used when a query does not ask for one
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Write attempts per create before giving up (at least 1)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// Backoff after the first failed attempt, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub initial_delay_ms: u64,

    /// Upper bound for any single backoff, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub max_delay_ms: u64,

    /// Growth factor between consecutive backoffs
    #[arg(long, default_value_t = 2.0)]
    pub backoff_multiplier: f64,

    /// Make every create succeed only on a random attempt (0-4)
    #[arg(long)]
    pub simulate_outages: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings the HTTP layer needs at request time.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub default_page_size: u32,
    pub simulate_outages: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            default_page_size: DEFAULT_PAGE_SIZE,
            simulate_outages: false,
        }
    }
}

impl ServerArgs {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            self.backoff_multiplier,
        )
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            default_page_size: self.page_size,
            simulate_outages: self.simulate_outages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library_defaults() {
        let args = ServerArgs::parse_from(["address-book-server"]);

        assert_eq!(args.bind, "0.0.0.0:3000");
        assert_eq!(args.seed, 10);
        assert_eq!(args.retry_policy(), RetryPolicy::default());
        assert_eq!(args.api_config(), ApiConfig::default());
        assert!(!args.verbose);
    }

    #[test]
    fn test_overrides() {
        let args = ServerArgs::parse_from([
            "address-book-server",
            "--bind",
            "127.0.0.1:8080",
            "--seed",
            "0",
            "--page-size",
            "25",
            "--max-attempts",
            "5",
            "--initial-delay-ms",
            "50",
            "--max-delay-ms",
            "400",
            "--backoff-multiplier",
            "3",
            "--simulate-outages",
            "-v",
        ]);

        assert_eq!(args.bind, "127.0.0.1:8080");
        assert_eq!(args.seed, 0);
        assert_eq!(
            args.retry_policy(),
            RetryPolicy::new(5, Duration::from_millis(50), Duration::from_millis(400), 3.0)
        );
        assert_eq!(
            args.api_config(),
            ApiConfig {
                default_page_size: 25,
                simulate_outages: true,
            }
        );
        assert!(args.verbose);
    }

    #[test]
    fn test_max_attempts_must_be_positive() {
        assert!(ServerArgs::try_parse_from(["address-book-server", "--max-attempts", "0"]).is_err());

        let args = ServerArgs::try_parse_from(["address-book-server", "--max-attempts", "1"]).unwrap();
        assert_eq!(args.retry_policy().max_attempts, 1);
    }
}
