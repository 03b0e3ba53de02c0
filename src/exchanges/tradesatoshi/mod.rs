pub mod conversions;
pub mod errors;
pub mod signer;

pub mod builder;
pub mod connector;
pub mod rest;

pub const EXCHANGE_ID: &str = "tradesatoshi";

pub use builder::{build_connector, TradeSatoshiBuilder};
pub use connector::TradeSatoshiConnector;
pub use errors::TradeSatoshiErrors;
pub use signer::TradeSatoshiSigner;
