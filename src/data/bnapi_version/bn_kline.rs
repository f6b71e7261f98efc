// Std library crates
use std::error::Error;
use std::fmt;

// External crates
use anyhow::{Result, bail};
use binance_sdk::config::ConfigurationRestApi;
use binance_sdk::spot::{
    SpotRestApi,
    rest_api::{KlinesIntervalEnum, KlinesItemInner, KlinesParams, RestApi},
};
use binance_sdk::{errors, errors::ConnectorError as connection_error};

// Local crates
use crate::config::binance::{BINANCE, BinanceApiConfig};
use crate::data::bar_source::FetchWindow;
use crate::domain::{Sample, Series};
use crate::utils::time_utils::epoch_ms_to_sec;

/// The two kline columns the scanner needs
#[derive(Debug, PartialEq)]
pub struct BNKline {
    pub open_timestamp_ms: i64,
    pub base_asset_volume: f64,
}

impl BNKline {
    pub fn into_sample(self, instrument: &str) -> Sample {
        Sample::new(
            instrument,
            epoch_ms_to_sec(self.open_timestamp_ms),
            // Fractional base volume is truncated; NaN and negatives map to 0.
            self.base_asset_volume.max(0.0) as u64,
        )
    }
}

// Custom error type for BNKline for better error messages.
#[derive(Debug)]
pub enum BNKlineError {
    InvalidLength,
    InvalidType(&'static str),
    OutOfOrder { previous_ms: i64, next_ms: i64 },
    ConnectionFailed(String),
}

impl fmt::Display for BNKlineError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            BNKlineError::InvalidLength => write!(f, "Invalid length"),
            BNKlineError::InvalidType(field) => write!(f, "Invalid type: {}", field),
            BNKlineError::OutOfOrder {
                previous_ms,
                next_ms,
            } => write!(
                f,
                "Kline open times not increasing: {} followed by {}",
                previous_ms, next_ms
            ),
            BNKlineError::ConnectionFailed(msg) => {
                write!(f, "Binance API connection failed: {}.", msg)
            }
        }
    }
}

impl Error for BNKlineError {}

impl TryFrom<Vec<KlinesItemInner>> for BNKline {
    type Error = BNKlineError;

    fn try_from(vec_inner_klines: Vec<KlinesItemInner>) -> Result<Self, Self::Error> {
        let mut items = vec_inner_klines.into_iter();
        let open_timestamp_ms = match items.next().ok_or(BNKlineError::InvalidLength)? {
            KlinesItemInner::Integer(a) => a,
            _ => return Err(BNKlineError::InvalidType("open_time")),
        };

        // Skip open, high, low and close
        let base_asset_volume = match items.nth(4).ok_or(BNKlineError::InvalidLength)? {
            KlinesItemInner::String(s) => s
                .parse::<f64>()
                .map_err(|_| BNKlineError::InvalidType("volume"))?,
            _ => return Err(BNKlineError::InvalidType("volume")),
        };

        Ok(BNKline {
            open_timestamp_ms,
            base_asset_volume,
        })
    }
}

fn convert_klines(data: Vec<Vec<KlinesItemInner>>) -> Result<Vec<BNKline>, BNKlineError> {
    data.into_iter().map(Vec::try_into).collect()
}

/// The detector walks the series from its newest end, so it must arrive oldest first.
fn ensure_ascending(klines: &[BNKline]) -> Result<(), BNKlineError> {
    match klines
        .windows(2)
        .find(|pair| pair[1].open_timestamp_ms <= pair[0].open_timestamp_ms)
    {
        Some(pair) => Err(BNKlineError::OutOfOrder {
            previous_ms: pair[0].open_timestamp_ms,
            next_ms: pair[1].open_timestamp_ms,
        }),
        None => Ok(()),
    }
}

fn configure_binance_client() -> Result<RestApi, anyhow::Error> {
    let config = BinanceApiConfig::default();
    let rest_conf = ConfigurationRestApi::builder()
        .timeout(config.timeout_ms)
        .retries(config.retries)
        .backoff(config.backoff_ms)
        .build()?;
    // Create the Spot REST API client
    let rest_client = SpotRestApi::production(rest_conf);
    Ok(rest_client)
}

fn log_connector_error(instrument: &str, conn_err: &errors::ConnectorError) {
    match conn_err {
        connection_error::ConnectorClientError(msg) => {
            log::warn!("{} Client error: check request parameters. {}", instrument, msg);
        }
        connection_error::TooManyRequestsError(msg) => {
            log::warn!("{} Rate limit exceeded. {}", instrument, msg);
        }
        connection_error::RateLimitBanError(msg) => {
            log::warn!("{} IP address banned for excessive requests. {}", instrument, msg);
        }
        errors::ConnectorError::ServerError { msg, status_code } => {
            log::warn!(
                "{} Server error: {} (status code: {:?})",
                instrument,
                msg,
                status_code
            );
        }
        errors::ConnectorError::NetworkError(msg) => {
            log::warn!("{} Network error: {}", instrument, msg);
        }
        errors::ConnectorError::NotFoundError(msg) => {
            log::warn!("{} Resource not found. {}", instrument, msg);
        }
        connection_error::BadRequestError(msg) => {
            // Binance answers unknown symbols with a 400
            log::warn!("{} Bad request (unknown symbol?). {}", instrument, msg);
        }
        other => {
            log::warn!("{} Unexpected connector error: {:?}", instrument, other);
        }
    }
}

async fn fetch_binance_klines(
    rest_client: &RestApi,
    params: KlinesParams,
    instrument: &str,
) -> Result<Vec<Vec<KlinesItemInner>>, anyhow::Error> {
    match rest_client.klines(params).await {
        Ok(r) => Ok(r.data().await?),
        Err(e) => {
            let reason = match e.downcast_ref::<errors::ConnectorError>() {
                Some(conn_err) => {
                    log_connector_error(instrument, conn_err);
                    conn_err.to_string()
                }
                None => e.to_string(),
            };
            Err(anyhow::Error::new(BNKlineError::ConnectionFailed(reason))
                .context(format!("Binance kline request failed for {}", instrument)))
        }
    }
}

/// All daily klines for `instrument` opening inside `window`, oldest first.
/// Pages forward from the window start until a short page comes back.
pub async fn load_daily_klines(instrument: &str, window: &FetchWindow) -> Result<Series> {
    let rest_client = configure_binance_client()?;
    let limit = BINANCE.limits.klines_limit;
    let mut start_time = window.start_ms();
    let mut all_klines: Vec<BNKline> = Vec::new();

    loop {
        let params = KlinesParams::builder(instrument.to_string(), KlinesIntervalEnum::Interval1d)
            .limit(limit)
            .start_time(Some(start_time))
            .end_time(Some(window.end_ms()))
            .build()?;

        let page = fetch_binance_klines(&rest_client, params, instrument).await?;
        let page_len = page.len();
        let bn_klines = convert_klines(page).map_err(|e| {
            anyhow::Error::new(e).context(format!("{} convert_klines failed", instrument))
        })?;

        let next_start = bn_klines.last().map(|k| k.open_timestamp_ms + 1);
        all_klines.extend(bn_klines);

        match next_start {
            Some(next) if page_len >= limit as usize && next <= window.end_ms() => {
                start_time = next;
            }
            _ => break,
        }
    }

    if let Err(e) = ensure_ascending(&all_klines) {
        bail!("{} returned unusable klines: {}", instrument, e);
    }

    Ok(all_klines
        .into_iter()
        .map(|k| k.into_sample(instrument))
        .collect())
}
