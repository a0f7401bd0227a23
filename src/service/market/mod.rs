//! Item valuation and market data ingest.

pub mod ingest;
pub mod price;

pub use ingest::MarketIngestService;
pub use price::PriceService;
