use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::kernel::{ErrorClassifier, ErrorTable, ResponseContext};
use crate::core::safe::get_string;
use serde_json::Value;

/// `{success: false, message}` envelopes, matched on the exact message.
pub struct TradeSatoshiErrors {
    table: ErrorTable,
}

impl TradeSatoshiErrors {
    pub fn new() -> Self {
        let table = ErrorTable::new()
            .exact(
                "Currency not found or is currently disabled or is currently withdraw disabled.",
                ErrorKind::Exchange,
            )
            .exact_all(
                &[
                    "Insufficient funds for trade.",
                    "Insufficient funds.",
                    "Insufficient Funds.",
                ],
                ErrorKind::InsufficientFunds,
            )
            .exact(
                "Address generated failed. REASON: currency status Maintenance.",
                ErrorKind::Exchange,
            )
            .exact("Failed to cancel order.", ErrorKind::OrderNotFound);
        Self { table }
    }
}

impl Default for TradeSatoshiErrors {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier for TradeSatoshiErrors {
    fn check(&self, response: &ResponseContext<'_>) -> Result<(), ExchangeError> {
        let Some(envelope) = response.json else {
            return Ok(());
        };
        match envelope.get("success") {
            None | Some(Value::Bool(true)) => Ok(()),
            Some(_) => {
                let message = get_string(envelope, "message").unwrap_or_default();
                let kind = self
                    .table
                    .classify(&[message.as_str()])
                    .unwrap_or(ErrorKind::Exchange);
                Err(response.error(kind))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(status: u16, body: &Value) -> Result<(), ExchangeError> {
        let text = body.to_string();
        TradeSatoshiErrors::new().check(&ResponseContext {
            exchange: "tradesatoshi",
            status,
            body: &text,
            json: Some(body),
        })
    }

    #[test]
    fn test_insufficient_funds_on_http_200() {
        let err = classify(200, &json!({"success": false, "message": "Insufficient Funds."}))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InsufficientFunds));
        assert_eq!(err.exchange(), Some("tradesatoshi"));
        assert!(err.feedback().unwrap_or_default().contains("Insufficient Funds."));
    }

    #[test]
    fn test_recorded_payloads() {
        let cases = [
            ("Insufficient funds for trade.", ErrorKind::InsufficientFunds),
            ("Failed to cancel order.", ErrorKind::OrderNotFound),
            (
                "Address generated failed. REASON: currency status Maintenance.",
                ErrorKind::Exchange,
            ),
            ("Something new went wrong", ErrorKind::Exchange),
        ];
        for (message, expected) in cases {
            let err = classify(200, &json!({"success": false, "message": message})).unwrap_err();
            assert_eq!(err.kind(), Some(expected), "{}", message);
        }
    }

    #[test]
    fn test_success_envelope_passes_even_with_odd_shape() {
        assert!(classify(200, &json!({"success": true, "result": "unexpected"})).is_ok());
        assert!(classify(200, &json!([1, 2, 3])).is_ok());
    }

    #[test]
    fn test_null_message_is_generic() {
        let err = classify(200, &json!({"success": false, "message": null})).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Exchange));
    }
}
