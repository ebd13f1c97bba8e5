pub mod coindcx;
pub mod http_client_factory;
pub mod mock;

pub use coindcx::CoinDcxMarketDataService;
pub use mock::MockCandleSource;
