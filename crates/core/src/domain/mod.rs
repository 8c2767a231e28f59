pub mod analysis;
pub mod association;
pub mod contract;
pub mod forecast;
pub mod market_trends;
pub mod query;
