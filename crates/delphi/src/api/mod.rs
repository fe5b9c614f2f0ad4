//! API clients for the news and financial-data providers

pub mod alpha_vantage;
pub mod news_api;
pub mod transport;

pub use alpha_vantage::{AlphaVantageClient, PricePoint};
pub use news_api::{NewsApiClient, NewsArticle};
pub use transport::{HttpTransport, ReqwestTransport};
