/// Kernel - the exchange-agnostic request pipeline
///
/// Every connector drives its calls through the same stages:
///
/// 1. `Endpoint` rows name the base URL, access level, HTTP method and path
///    template of each vendor call.
/// 2. `implode_path` substitutes `{placeholder}` tokens and removes the
///    consumed parameters.
/// 3. Public calls get a sorted query string; private calls take a nonce from
///    a `NonceSource` and are authenticated by the connector's `Signer`.
/// 4. The `HttpClient` collaborator performs the I/O.
/// 5. The connector's `ErrorClassifier` inspects the vendor envelope, then
///    `default_http_error` handles any remaining non-2xx status.
///
/// # Example
/// ```rust,no_run
/// use unifex::core::kernel::*;
/// use reqwest::Method;
///
/// # async fn demo() -> Result<(), unifex::ExchangeError> {
/// const TIME: Endpoint = Endpoint::public("public", Method::GET, "time");
///
/// let client = RestClientBuilder::new(
///     RestClientConfig::new("hbtc").with_base_url("public", "https://api.hbtc.com/openapi/v1"),
/// )
/// .build()?;
/// let server_time = client.request(&TIME, Params::new()).await?;
/// println!("{}", server_time);
/// # Ok(())
/// # }
/// ```
pub mod classify;
pub mod nonce;
pub mod rest;
pub mod signer;
pub mod transport;

pub use classify::{default_http_error, ErrorClassifier, ErrorTable, ResponseContext};
pub use nonce::{Clock, FixedClock, FixedNonce, MonotonicNonce, NonceSource, SystemClock};
pub use rest::{params, Access, Endpoint, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{
    hash_hex, hmac_base64, hmac_bytes, hmac_hex, implode_path, urlencode, with_query, Credentials,
    HashAlgorithm, Params, PreparedRequest, Signer,
};
pub use transport::{HttpClient, HttpRequest, HttpResponse, ReqwestTransport, TransportConfig};
