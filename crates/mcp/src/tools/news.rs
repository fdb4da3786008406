// Ticker news tool

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::yahoo::{NewsItem, YahooClient, YahooError};
use crate::tools::{json_schema_object, json_schema_string, Tool};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Fetches recent news stories for a ticker symbol
pub struct NewsTool {
    yahoo: Arc<YahooClient>,
}

impl NewsTool {
    pub fn new(yahoo: Arc<YahooClient>) -> Self {
        Self { yahoo }
    }
}

#[derive(Debug, Deserialize)]
struct NewsArgs {
    ticker: String,
}

/// Render stories as the newline-separated blocks clients expect
pub fn format_news(items: &[NewsItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "Title: {}\nPublisher: {}\nSummary: {}\nURL: {}",
                item.title, item.publisher, item.summary, item.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait::async_trait]
impl Tool for NewsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_yahoo_finance_news".to_string(),
            description: "Get news for a given ticker symbol from yahoo finance.".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "ticker": json_schema_string(
                        "The ticker symbol of the stock to get news for, e.g. \"AAPL\""
                    )
                }),
                vec!["ticker"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: NewsArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for get_yahoo_finance_news")?;

        match self.yahoo.news(&args.ticker).await {
            Ok(items) if items.is_empty() => Ok(CallToolResult::error(format!(
                "No news found for company that searched with {} ticker.",
                args.ticker
            ))),
            Ok(items) => Ok(CallToolResult::text(format_news(&items))),
            Err(YahooError::NotFound) => Ok(CallToolResult::error(format!(
                "Company ticker {} not found.",
                args.ticker
            ))),
            Err(e) => {
                tracing::error!("Error getting news for {}: {}", args.ticker, e);
                Ok(CallToolResult::error(format!(
                    "Error getting news for {}: {}",
                    args.ticker, e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_news_blocks() {
        let items = vec![
            NewsItem {
                title: "Apple unveils results".to_string(),
                publisher: "Reuters".to_string(),
                summary: "Earnings beat.".to_string(),
                url: "https://example.com/a".to_string(),
            },
            NewsItem {
                title: "Supply chain update".to_string(),
                publisher: "Bloomberg".to_string(),
                summary: String::new(),
                url: "https://example.com/b".to_string(),
            },
        ];
        let text = format_news(&items);
        assert!(text.starts_with("Title: Apple unveils results\n"));
        assert!(text.contains("\n\nTitle: Supply chain update"));
        assert!(text.contains("URL: https://example.com/b"));
    }

    #[test]
    fn test_format_news_empty() {
        assert_eq!(format_news(&[]), "");
    }
}
