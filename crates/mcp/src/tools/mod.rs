pub mod info;
pub mod news;
pub mod prices;
pub mod yahoo;
mod registry;

pub use info::StockInfoTool;
pub use news::NewsTool;
pub use prices::HistoricalPricesTool;
pub use registry::{json_schema_object, json_schema_string, Tool, ToolRegistry};
pub use yahoo::YahooClient;
