//! Binance-specific configuration constants and types.

/// Configuration for Binance REST API client
/// (This is the runtime struct used by the kline fetcher)
pub struct BinanceApiConfig {
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for BinanceApiConfig {
    fn default() -> Self {
        Self {
            timeout_ms: BINANCE.client.timeout_ms,
            retries: BINANCE.client.retries,
            backoff_ms: BINANCE.client.backoff_ms,
        }
    }
}

/// Configuration for REST API Limits
pub struct RestLimits {
    /// Maximum number of klines returned in a single request.
    /// Five months of daily bars fit comfortably in one page.
    pub klines_limit: i32,
}

/// Default values for the Rest Client
pub struct ClientDefaults {
    pub timeout_ms: u64,
    /// A failed fetch is reported as a failed instrument, never retried.
    pub retries: u32,
    pub backoff_ms: u64,
}

/// The Master Configuration Struct
pub struct BinanceConfig {
    pub limits: RestLimits,
    pub client: ClientDefaults,
}

pub const BINANCE: BinanceConfig = BinanceConfig {
    limits: RestLimits { klines_limit: 1000 },
    client: ClientDefaults {
        timeout_ms: 5000,
        retries: 0,
        backoff_ms: 0,
    },
};
