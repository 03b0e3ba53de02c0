use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    hash_hex, urlencode, with_query, Credentials, HashAlgorithm, HttpRequest, PreparedRequest,
    Signer,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of the bearer token.
///
/// `query_hash` is the hex SHA-512 of the url-encoded parameters and is
/// left out, together with its algorithm name, when there are none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpbitClaims {
    pub access_key: String,
    pub nonce: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub query_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub query_hash_alg: Option<String>,
}

/// Upbit private request signing: an HS256 JWT over [`UpbitClaims`] sent
/// as `Authorization: Bearer`.
#[derive(Debug, Clone)]
pub struct UpbitSigner {
    credentials: Option<Credentials>,
}

impl UpbitSigner {
    pub const fn new(credentials: Option<Credentials>) -> Self {
        Self { credentials }
    }

    pub fn claims(api_key: &str, query: &str, nonce: u64) -> UpbitClaims {
        let (query_hash, query_hash_alg) = if query.is_empty() {
            (None, None)
        } else {
            (
                Some(hash_hex(HashAlgorithm::Sha512, query.as_bytes())),
                Some("SHA512".to_string()),
            )
        };
        UpbitClaims {
            access_key: api_key.to_string(),
            nonce: nonce.to_string(),
            query_hash,
            query_hash_alg,
        }
    }
}

impl Signer for UpbitSigner {
    fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn sign(&self, request: PreparedRequest, nonce: u64) -> Result<HttpRequest, ExchangeError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::authentication(&request.exchange, "apiKey and secret are required")
        })?;

        let query = urlencode(&request.params);
        let claims = Self::claims(credentials.api_key(), &query, nonce);
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(credentials.secret().as_bytes()),
        )
        .map_err(|e| {
            ExchangeError::authentication(&request.exchange, format!("cannot sign token: {}", e))
        })?;

        let mut headers = vec![("Authorization".to_string(), format!("Bearer {}", token))];
        if request.method == Method::GET || request.method == Method::DELETE {
            Ok(HttpRequest {
                method: request.method,
                url: with_query(&request.url, &query),
                headers,
                body: None,
            })
        } else {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
            let body: serde_json::Map<String, Value> = request.params.into_iter().collect();
            Ok(HttpRequest {
                method: request.method,
                url: request.url,
                headers,
                body: Some(Value::Object(body).to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::{params, Params};
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use serde_json::json;

    fn prepared(method: Method, params: Params) -> PreparedRequest {
        PreparedRequest {
            exchange: "upbit".to_string(),
            method,
            url: "https://api.upbit.com/v1/orders".to_string(),
            path: "orders".to_string(),
            params,
        }
    }

    fn signer() -> UpbitSigner {
        UpbitSigner::new(Some(Credentials::new("access", "secret")))
    }

    fn claims_of(request: &HttpRequest) -> UpbitClaims {
        let token = request
            .header("Authorization")
            .and_then(|h| h.strip_prefix("Bearer "))
            .unwrap();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        decode::<UpbitClaims>(token, &DecodingKey::from_secret(b"secret"), &validation)
            .unwrap()
            .claims
    }

    #[test]
    fn test_get_hashes_query() {
        let request = signer()
            .sign(
                prepared(
                    Method::GET,
                    params([("state", json!("wait")), ("market", json!("KRW-BTC"))]),
                ),
                1_600_000_000_000,
            )
            .unwrap();

        assert_eq!(
            request.url,
            "https://api.upbit.com/v1/orders?market=KRW-BTC&state=wait"
        );
        assert!(request.body.is_none());
        let claims = claims_of(&request);
        assert_eq!(claims.access_key, "access");
        assert_eq!(claims.nonce, "1600000000000");
        assert_eq!(
            claims.query_hash.as_deref(),
            Some(hash_hex(HashAlgorithm::Sha512, b"market=KRW-BTC&state=wait").as_str())
        );
        assert_eq!(claims.query_hash_alg.as_deref(), Some("SHA512"));
    }

    #[test]
    fn test_post_sends_json_body() {
        let request = signer()
            .sign(
                prepared(
                    Method::POST,
                    params([("market", json!("KRW-BTC")), ("side", json!("bid"))]),
                ),
                5,
            )
            .unwrap();
        assert_eq!(request.url, "https://api.upbit.com/v1/orders");
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"market": "KRW-BTC", "side": "bid"}));
        let claims = claims_of(&request);
        assert_eq!(
            claims.query_hash.as_deref(),
            Some(hash_hex(HashAlgorithm::Sha512, b"market=KRW-BTC&side=bid").as_str())
        );
    }

    #[test]
    fn test_empty_query_has_no_hash() {
        let request = signer()
            .sign(prepared(Method::GET, Params::new()), 9)
            .unwrap();
        assert_eq!(request.url, "https://api.upbit.com/v1/orders");
        let claims = claims_of(&request);
        assert!(claims.query_hash.is_none());
        assert!(claims.query_hash_alg.is_none());
    }

    #[test]
    fn test_claims_serialize_without_hash() {
        let claims = UpbitSigner::claims("access", "", 3);
        assert_eq!(
            serde_json::to_value(&claims).unwrap(),
            json!({"access_key": "access", "nonce": "3"})
        );
    }

    #[test]
    fn test_missing_credentials() {
        let signer = UpbitSigner::new(None);
        assert!(!signer.has_credentials());
        assert!(signer.sign(prepared(Method::GET, Params::new()), 1).is_err());
    }
}
