pub mod http;
pub mod market_store;
pub mod scheduler;

pub use http::HttpSignalSink;
pub use market_store::SqliteMarketData;
pub use scheduler::Scheduler;
