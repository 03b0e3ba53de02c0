pub mod conversions;
pub mod errors;
pub mod signer;

pub mod builder;
pub mod connector;
pub mod rest;

pub const EXCHANGE_ID: &str = "upbit";

pub use builder::{build_connector, UpbitBuilder};
pub use connector::UpbitConnector;
pub use errors::UpbitErrors;
pub use signer::UpbitSigner;
