pub mod hbtc;
pub mod tradesatoshi;
pub mod upbit;
