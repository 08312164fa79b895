use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

// Yahoo throttles aggressively above a few hundred in-flight requests.
const FETCH_BATCH_SIZE: usize = 100;
const BATCH_PAUSE_MS: u64 = 250;

/// One daily trading session. Immutable once fetched; a series is ordered
/// chronologically with no duplicate dates.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// The Bursa Malaysia universe: every four-digit board code with the .KL
/// suffix. Codes that are not listed simply come back empty from the
/// provider and fall out during screening.
pub fn klse_universe() -> Vec<String> {
    (0..10_000).map(|code| format!("{code:04}.KL")).collect()
}

// --- Provider payload (Yahoo v8 chart endpoint) ---
//
// Halted or partially-reported sessions arrive as nulls inside the quote
// arrays, so every field is Option and incomplete rows are dropped.

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Deserialize, Debug)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Deserialize, Debug, Default)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

fn bars_from_chart(result: ChartResult) -> Vec<Bar> {
    let quote = match result.indicators.quote.into_iter().next() {
        Some(q) => q,
        None => return Vec::new(),
    };

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let row = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
            quote.volume.get(i).copied().flatten(),
        );
        if let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = row {
            let date = match DateTime::from_timestamp(*ts, 0) {
                Some(dt) => dt.date_naive(),
                None => continue,
            };
            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }
    }
    bars
}

/// Fetches one symbol's daily series. Any failure (HTTP error, throttle,
/// unknown symbol, malformed payload) yields `None`; a missing symbol is a
/// filtering criterion, not an error.
async fn fetch_daily(
    client: &Client,
    symbol: &str,
    period1: i64,
    period2: i64,
) -> Option<(String, Vec<Bar>)> {
    let url = format!("{CHART_URL}/{symbol}");
    let query = [
        ("period1", period1.to_string()),
        ("period2", period2.to_string()),
        ("interval", "1d".to_string()),
        ("events", "history".to_string()),
    ];

    let response = client.get(&url).query(&query).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }

    let payload: ChartResponse = response.json().await.ok()?;
    let result = match payload.chart.result {
        Some(results) => results.into_iter().next()?,
        None => {
            if let Some(error) = payload.chart.error {
                tracing::debug!(symbol, %error, "provider returned no result");
            }
            return None;
        }
    };
    let bars = bars_from_chart(result);
    if bars.is_empty() {
        return None;
    }
    Some((symbol.to_string(), bars))
}

/// Bulk-fetches the daily series for every symbol in the universe over
/// `[start, end)`, in bounded concurrent batches. Symbols the provider
/// cannot serve are absent from the map. Errors only when the provider
/// returns nothing at all, since no data means no work is possible.
pub async fn fetch_universe(
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<String, Vec<Bar>>> {
    let client = Client::builder()
        .pool_max_idle_per_host(50)
        .user_agent("Mozilla/5.0 (X11; Linux x86_64) klse-ema-screener/0.1")
        .timeout(Duration::from_secs(30))
        .build()?;

    let period1 = start
        .and_hms_opt(0, 0, 0)
        .context("invalid start of window")?
        .and_utc()
        .timestamp();
    let period2 = end
        .and_hms_opt(0, 0, 0)
        .context("invalid end of window")?
        .and_utc()
        .timestamp();

    let mut series = HashMap::new();
    let total_batches = symbols.len().div_ceil(FETCH_BATCH_SIZE);

    for (i, batch) in symbols.chunks(FETCH_BATCH_SIZE).enumerate() {
        let tasks: Vec<_> = batch
            .iter()
            .map(|symbol| fetch_daily(&client, symbol, period1, period2))
            .collect();
        let results = futures::future::join_all(tasks).await;
        series.extend(results.into_iter().flatten());

        tracing::debug!(
            batch = i + 1,
            total_batches,
            fetched = series.len(),
            "fetch batch complete"
        );

        if i + 1 < total_batches {
            tokio::time::sleep(Duration::from_millis(BATCH_PAUSE_MS)).await;
        }
    }

    if series.is_empty() {
        return Err(anyhow!(
            "provider returned no data for any of {} symbols",
            symbols.len()
        ));
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_is_padded_and_suffixed() {
        let universe = klse_universe();
        assert_eq!(universe.len(), 10_000);
        assert_eq!(universe[0], "0000.KL");
        assert_eq!(universe[7], "0007.KL");
        assert_eq!(universe[9_999], "9999.KL");
    }

    #[test]
    fn incomplete_rows_are_dropped() {
        let result = ChartResult {
            timestamp: vec![1_700_000_000, 1_700_086_400, 1_700_172_800],
            indicators: Indicators {
                quote: vec![QuoteBlock {
                    open: vec![Some(1.0), None, Some(1.2)],
                    high: vec![Some(1.1), Some(1.2), Some(1.3)],
                    low: vec![Some(0.9), Some(1.0), Some(1.1)],
                    close: vec![Some(1.05), Some(1.15), Some(1.25)],
                    volume: vec![Some(1000), Some(2000), Some(3000)],
                }],
            },
        };

        let bars = bars_from_chart(result);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 1.05);
        assert_eq!(bars[1].close, 1.25);
    }

    #[test]
    fn error_envelope_carries_no_result() {
        let raw = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let payload: ChartResponse = serde_json::from_str(raw).unwrap();
        assert!(payload.chart.result.is_none());
        let error = payload.chart.error.unwrap();
        assert_eq!(error["code"], "Not Found");
    }

    #[test]
    fn empty_quote_block_yields_no_bars() {
        let result = ChartResult {
            timestamp: vec![1_700_000_000],
            indicators: Indicators { quote: vec![] },
        };
        assert!(bars_from_chart(result).is_empty());
    }
}
