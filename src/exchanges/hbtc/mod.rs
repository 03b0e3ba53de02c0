pub mod conversions;
pub mod errors;
pub mod signer;

pub mod builder;
pub mod connector;
pub mod rest;

pub const EXCHANGE_ID: &str = "hbtc";

pub use builder::{build_connector, HbtcBuilder};
pub use connector::HbtcConnector;
pub use errors::HbtcErrors;
pub use signer::HbtcSigner;
