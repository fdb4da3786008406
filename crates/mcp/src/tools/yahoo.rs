// Yahoo Finance HTTP client shared by the finance tools.
//
// Wraps the same public endpoints the yfinance library uses: the chart
// endpoint for historical prices, quoteSummary for company data, and the
// search endpoint for news. Response parsing lives in pure functions so
// it can be tested against canned payloads without a network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Modules requested from quoteSummary for get_stock_info
pub const QUOTE_SUMMARY_MODULES: &str =
    "price,summaryDetail,assetProfile,financialData,defaultKeyStatistics";

#[derive(Debug, thiserror::Error)]
pub enum YahooError {
    /// Yahoo does not know the ticker
    #[error("ticker not found")]
    NotFound,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response shape: {0}")]
    Malformed(String),
}

pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> Result<Self, YahooError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Override the endpoint root (tests point this at a local server)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, YahooError> {
        let client = reqwest::Client::builder()
            .user_agent("finbridge-mcp/0.1.0")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn get_json(&self, url: String) -> Result<Value, YahooError> {
        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(YahooError::NotFound);
        }
        Ok(response.json::<Value>().await?)
    }

    /// Historical OHLCV data for a ticker
    pub async fn chart(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<PriceRecord>, YahooError> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}&includeAdjustedClose=true",
            self.base_url, ticker, period, interval
        );
        let body = self.get_json(url).await?;
        parse_chart(&body)
    }

    /// Company information for a ticker, merged across quoteSummary modules
    pub async fn quote_summary(&self, ticker: &str) -> Result<Value, YahooError> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}",
            self.base_url, ticker, QUOTE_SUMMARY_MODULES
        );
        let body = self.get_json(url).await?;
        parse_quote_summary(&body)
    }

    /// Recent news stories for a ticker
    pub async fn news(&self, ticker: &str) -> Result<Vec<NewsItem>, YahooError> {
        let url = format!(
            "{}/v1/finance/search?q={}&newsCount=10&quotesCount=0",
            self.base_url, ticker
        );
        let body = self.get_json(url).await?;
        parse_news(&body)
    }
}

/// One row of historical price data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
    pub adj_close: Option<f64>,
}

/// One news story
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub publisher: String,
    pub summary: String,
    pub url: String,
}

fn as_not_found(error: &Value) -> bool {
    // Yahoo reports unknown tickers inside the envelope as
    // {"error": {"code": "Not Found", ...}}
    error
        .get("code")
        .and_then(Value::as_str)
        .map(|code| code.eq_ignore_ascii_case("not found"))
        .unwrap_or(false)
}

fn envelope_result<'a>(body: &'a Value, key: &str) -> Result<&'a Value, YahooError> {
    let envelope = body
        .get(key)
        .ok_or_else(|| YahooError::Malformed(format!("missing {} envelope", key)))?;

    if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
        if as_not_found(error) {
            return Err(YahooError::NotFound);
        }
        return Err(YahooError::Malformed(error.to_string()));
    }

    envelope
        .get("result")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .ok_or(YahooError::NotFound)
}

fn format_timestamp(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

/// Flatten a chart response into dated OHLCV records
pub fn parse_chart(body: &Value) -> Result<Vec<PriceRecord>, YahooError> {
    let result = envelope_result(body, "chart")?;

    let timestamps = result
        .get("timestamp")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let quote = result
        .pointer("/indicators/quote/0")
        .ok_or_else(|| YahooError::Malformed("missing quote indicators".to_string()))?;
    let adjclose = result.pointer("/indicators/adjclose/0/adjclose");

    let series = |field: &str| -> Vec<Option<f64>> {
        quote
            .get(field)
            .and_then(Value::as_array)
            .map(|values| values.iter().map(Value::as_f64).collect())
            .unwrap_or_default()
    };

    let opens = series("open");
    let highs = series("high");
    let lows = series("low");
    let closes = series("close");
    let volumes: Vec<Option<u64>> = quote
        .get("volume")
        .and_then(Value::as_array)
        .map(|values| values.iter().map(Value::as_u64).collect())
        .unwrap_or_default();
    let adjcloses: Vec<Option<f64>> = adjclose
        .and_then(Value::as_array)
        .map(|values| values.iter().map(Value::as_f64).collect())
        .unwrap_or_default();

    let records = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let ts = ts.as_i64()?;
            Some(PriceRecord {
                date: format_timestamp(ts),
                open: opens.get(i).copied().flatten(),
                high: highs.get(i).copied().flatten(),
                low: lows.get(i).copied().flatten(),
                close: closes.get(i).copied().flatten(),
                volume: volumes.get(i).copied().flatten(),
                adj_close: adjcloses.get(i).copied().flatten(),
            })
        })
        .collect();

    Ok(records)
}

/// Merge quoteSummary modules into one flat object
pub fn parse_quote_summary(body: &Value) -> Result<Value, YahooError> {
    let result = envelope_result(body, "quoteSummary")?;

    let modules = result
        .as_object()
        .ok_or_else(|| YahooError::Malformed("quoteSummary result is not an object".to_string()))?;

    let mut merged = serde_json::Map::new();
    for module in modules.values() {
        if let Some(fields) = module.as_object() {
            for (key, value) in fields {
                merged.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
    }

    if merged.is_empty() {
        return Err(YahooError::NotFound);
    }
    Ok(Value::Object(merged))
}

/// Extract story items from a search response
pub fn parse_news(body: &Value) -> Result<Vec<NewsItem>, YahooError> {
    let stories = body
        .get("news")
        .and_then(Value::as_array)
        .ok_or_else(|| YahooError::Malformed("missing news array".to_string()))?;

    let items = stories
        .iter()
        .filter_map(|story| {
            let title = story.get("title").and_then(Value::as_str)?;
            Some(NewsItem {
                title: title.to_string(),
                publisher: story
                    .get("publisher")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                summary: story
                    .get("summary")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                url: story
                    .get("link")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect();

    Ok(items)
}
