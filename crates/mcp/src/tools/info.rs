// Stock information tool

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::yahoo::{YahooClient, YahooError};
use crate::tools::{json_schema_object, json_schema_string, Tool};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Fetches company and trading information for a ticker symbol
pub struct StockInfoTool {
    yahoo: Arc<YahooClient>,
}

impl StockInfoTool {
    pub fn new(yahoo: Arc<YahooClient>) -> Self {
        Self { yahoo }
    }
}

#[derive(Debug, Deserialize)]
struct StockInfoArgs {
    ticker: String,
}

#[async_trait::async_trait]
impl Tool for StockInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_stock_info".to_string(),
            description: "Get stock information for a given ticker symbol from yahoo finance. \
                          Include the following information: Stock Price & Trading Info, Company \
                          Information, Financial Metrics, Earnings & Revenue, Margins & Returns, \
                          Dividends, Balance Sheet, Ownership, Analyst Coverage, Risk Metrics, \
                          Other."
                .to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "ticker": json_schema_string(
                        "The ticker symbol of the stock to get information for, e.g. \"AAPL\""
                    )
                }),
                vec!["ticker"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: StockInfoArgs =
            serde_json::from_value(arguments).context("Invalid arguments for get_stock_info")?;

        match self.yahoo.quote_summary(&args.ticker).await {
            Ok(info) => Ok(CallToolResult::json(&info)),
            Err(YahooError::NotFound) => Ok(CallToolResult::error(format!(
                "Company ticker {} not found.",
                args.ticker
            ))),
            Err(e) => {
                tracing::error!("Error getting stock information for {}: {}", args.ticker, e);
                Ok(CallToolResult::error(format!(
                    "Error getting stock information for {}: {}",
                    args.ticker, e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ToolContent;

    #[test]
    fn test_schema_requires_ticker() {
        let tool = StockInfoTool::new(Arc::new(YahooClient::new().unwrap()));
        let schema = tool.schema();
        assert_eq!(schema.name, "get_stock_info");
        assert_eq!(schema.input_schema["required"][0], "ticker");
    }

    #[tokio::test]
    async fn test_missing_ticker_is_invalid_params() {
        let tool = StockInfoTool::new(Arc::new(YahooClient::new().unwrap()));
        assert!(tool.execute(serde_json::json!({})).await.is_err());
    }

    #[test]
    fn test_not_found_message_shape() {
        let result = CallToolResult::error("Company ticker XYZXYZ not found.");
        let ToolContent::Text { text } = &result.content[0];
        assert!(text.contains("not found"));
    }
}
