pub mod core;
pub mod exchanges;
pub mod utils;

pub use core::{
    config::ExchangeConfig,
    errors::{ErrorKind, ExchangeError},
    markets::MarketCache,
    traits::{AccountInfo, ExchangeConnector, MarketDataSource, OrderPlacer},
    types::*,
};
pub use exchanges::hbtc::HbtcConnector;
pub use exchanges::tradesatoshi::TradeSatoshiConnector;
pub use exchanges::upbit::UpbitConnector;
pub use utils::exchange_factory::{ExchangeFactory, ExchangeKind};
