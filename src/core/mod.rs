pub mod config;
pub mod errors;
pub mod kernel;
pub mod markets;
pub mod normalize;
pub mod precision;
pub mod safe;
pub mod traits;
pub mod types;
