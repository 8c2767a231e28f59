pub mod backend;
pub mod domain;
pub mod orchestrator;
pub mod present;
pub mod time;

pub mod config {
    use crate::orchestrator::FetchStrategy;
    use std::time::Duration;

    pub const DEFAULT_PREDICTION_API_URL: &str = "http://localhost:8000";
    pub const DEFAULT_MARKET_TRENDS_URL: &str = "http://localhost:3000";
    pub const DEFAULT_PROXY_UPSTREAM_URL: &str = "http://127.0.0.1:5001";
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub prediction_api_url: String,
        pub request_timeout: Duration,
        pub fetch_strategy: FetchStrategy,
        pub market_trends_url: String,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                prediction_api_url: DEFAULT_PREDICTION_API_URL.to_string(),
                request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
                fetch_strategy: FetchStrategy::Sequential,
                market_trends_url: DEFAULT_MARKET_TRENDS_URL.to_string(),
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(env_var)
        }

        /// Same as [`Settings::from_env`], reading values through `get`.
        pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let defaults = Self::default();
            let get = |key: &str| non_empty(get(key));

            // NEXT_PUBLIC_API_URL is what the web front-end deployment already sets.
            let prediction_api_url = get("PREDICTION_API_URL")
                .or_else(|| get("NEXT_PUBLIC_API_URL"))
                .unwrap_or(defaults.prediction_api_url);

            let fetch_strategy = match get("PREDICTION_FETCH_STRATEGY") {
                Some(s) => s.parse::<FetchStrategy>()?,
                None => defaults.fetch_strategy,
            };

            Ok(Self {
                prediction_api_url,
                request_timeout: request_timeout(get("PREDICTION_TIMEOUT_SECS"))?,
                fetch_strategy,
                market_trends_url: get("MARKET_TRENDS_URL").unwrap_or(defaults.market_trends_url),
                sentry_dsn: get("SENTRY_DSN"),
            })
        }
    }

    /// The subset the prediction proxy runs on; unrelated keys are never parsed.
    #[derive(Debug, Clone)]
    pub struct ProxySettings {
        pub upstream_url: String,
        pub request_timeout: Duration,
        pub sentry_dsn: Option<String>,
    }

    impl ProxySettings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(env_var)
        }

        pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let get = |key: &str| non_empty(get(key));
            Ok(Self {
                upstream_url: get("PROXY_UPSTREAM_URL")
                    .unwrap_or_else(|| DEFAULT_PROXY_UPSTREAM_URL.to_string()),
                request_timeout: request_timeout(get("PREDICTION_TIMEOUT_SECS"))?,
                sentry_dsn: get("SENTRY_DSN"),
            })
        }
    }

    /// For binaries that need nothing else from the environment.
    pub fn sentry_dsn_from_env() -> Option<String> {
        non_empty(env_var("SENTRY_DSN"))
    }

    fn request_timeout(raw: Option<String>) -> anyhow::Result<Duration> {
        let Some(s) = raw else {
            return Ok(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
        };
        let secs = s.parse::<u64>().map_err(|e| {
            anyhow::anyhow!("PREDICTION_TIMEOUT_SECS must be an integer (got {s:?}): {e}")
        })?;
        anyhow::ensure!(secs > 0, "PREDICTION_TIMEOUT_SECS must be > 0");
        Ok(Duration::from_secs(secs))
    }

    fn env_var(key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn non_empty(value: Option<String>) -> Option<String> {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

}
