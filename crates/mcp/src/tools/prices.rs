// Historical stock price tool

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::yahoo::{YahooClient, YahooError};
use crate::tools::{json_schema_object, json_schema_string, Tool};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

pub const VALID_PERIODS: &[&str] = &[
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

pub const VALID_INTERVALS: &[&str] = &[
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

/// Fetches historical OHLCV data for a ticker symbol
pub struct HistoricalPricesTool {
    yahoo: Arc<YahooClient>,
}

impl HistoricalPricesTool {
    pub fn new(yahoo: Arc<YahooClient>) -> Self {
        Self { yahoo }
    }
}

#[derive(Debug, Deserialize)]
struct HistoricalPricesArgs {
    ticker: String,
    #[serde(default = "default_period")]
    period: String,
    #[serde(default = "default_interval")]
    interval: String,
}

fn default_period() -> String {
    "1mo".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

#[async_trait::async_trait]
impl Tool for HistoricalPricesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_historical_stock_prices".to_string(),
            description: "Get historical stock prices for a given ticker symbol from yahoo \
                          finance. Include the following information: Date, Open, High, Low, \
                          Close, Volume, Adj Close."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "ticker": json_schema_string(
                        "The ticker symbol of the stock to get historical prices for, e.g. \"AAPL\""
                    ),
                    "period": json_schema_string(
                        "Valid periods: 1d,5d,1mo,3mo,6mo,1y,2y,5y,10y,ytd,max. Default is \"1mo\""
                    ),
                    "interval": json_schema_string(
                        "Valid intervals: 1m,2m,5m,15m,30m,60m,90m,1h,1d,5d,1wk,1mo,3mo. \
                         Intraday data cannot extend last 60 days. Default is \"1d\""
                    )
                }),
                vec!["ticker"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: HistoricalPricesArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for get_historical_stock_prices")?;

        if !VALID_PERIODS.contains(&args.period.as_str()) {
            return Ok(CallToolResult::error(format!(
                "Invalid period: {}. Valid periods: {}",
                args.period,
                VALID_PERIODS.join(",")
            )));
        }
        if !VALID_INTERVALS.contains(&args.interval.as_str()) {
            return Ok(CallToolResult::error(format!(
                "Invalid interval: {}. Valid intervals: {}",
                args.interval,
                VALID_INTERVALS.join(",")
            )));
        }

        match self
            .yahoo
            .chart(&args.ticker, &args.period, &args.interval)
            .await
        {
            Ok(records) => Ok(CallToolResult::json(&records)),
            Err(YahooError::NotFound) => Ok(CallToolResult::error(format!(
                "Company ticker {} not found.",
                args.ticker
            ))),
            Err(e) => {
                tracing::error!("Error getting historical stock prices for {}: {}", args.ticker, e);
                Ok(CallToolResult::error(format!(
                    "Error getting historical stock prices for {}: {}",
                    args.ticker, e
                )))
            }
        }
    }
}
