use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::kernel::{ErrorClassifier, ErrorTable, ResponseContext};
use crate::core::safe::get_string;

/// Responses carrying an `error` object.
///
/// The message is matched before the name, exact phrases before
/// substrings; anything unmatched is a generic exchange error.
pub struct UpbitErrors {
    table: ErrorTable,
}

impl UpbitErrors {
    pub fn new() -> Self {
        let table = ErrorTable::new()
            .exact("This key has expired.", ErrorKind::Authentication)
            .exact(
                "Missing request parameter error. Check the required parameters!",
                ErrorKind::BadRequest,
            )
            .exact(
                "side is missing, side does not have a valid value",
                ErrorKind::InvalidOrder,
            )
            .broad("thirdparty_agreement_required", ErrorKind::PermissionDenied)
            .broad("out_of_scope", ErrorKind::PermissionDenied)
            .broad("order_not_found", ErrorKind::OrderNotFound)
            .broad("insufficient_funds", ErrorKind::InsufficientFunds)
            .broad("invalid_access_key", ErrorKind::Authentication)
            .broad("jwt_verification", ErrorKind::Authentication)
            .broad("create_ask_error", ErrorKind::Exchange)
            .broad("create_bid_error", ErrorKind::Exchange)
            .broad("volume_too_large", ErrorKind::InvalidOrder)
            .broad("invalid_funds", ErrorKind::InvalidOrder);
        Self { table }
    }
}

impl Default for UpbitErrors {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier for UpbitErrors {
    fn check(&self, response: &ResponseContext<'_>) -> Result<(), ExchangeError> {
        let Some(error) = response.json.and_then(|json| json.get("error")) else {
            return Ok(());
        };
        if error.is_null() {
            return Ok(());
        }
        let message = get_string(error, "message").unwrap_or_default();
        let name = get_string(error, "name").unwrap_or_default();
        let kind = self
            .table
            .classify(&[message.as_str(), name.as_str()])
            .unwrap_or(ErrorKind::Exchange);
        Err(response.error(kind))
    }
}
