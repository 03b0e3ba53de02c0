use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::kernel::{ErrorClassifier, ErrorTable, ResponseContext};
use crate::core::safe::get_string;

/// Responses carrying a `code` other than `0`, matched exactly on the code.
pub struct HbtcErrors {
    table: ErrorTable,
}

impl HbtcErrors {
    pub fn new() -> Self {
        let table = ErrorTable::new()
            .exact_all(&["-1000", "-1001", "-1006", "-1112", "-2016"], ErrorKind::Exchange)
            .exact_all(
                &["-1002", "-1022", "-1125", "-2014", "-2015"],
                ErrorKind::Authentication,
            )
            .exact_all(&["-1003", "-1015"], ErrorKind::RateLimited)
            .exact_all(
                &[
                    "-1004", "-1021", "-1100", "-1101", "-1102", "-1103", "-1104", "-1105",
                    "-1106", "-1111", "-1120", "-1127", "-1128", "-1130",
                ],
                ErrorKind::BadRequest,
            )
            .exact("-1005", ErrorKind::PermissionDenied)
            .exact_all(&["-1007", "-1016", "-1146", "-1147"], ErrorKind::ExchangeNotAvailable)
            .exact("-1020", ErrorKind::NotSupported)
            .exact_all(
                &[
                    "-1014", "-1114", "-1115", "-1116", "-1117", "-1118", "-1119", "-1132",
                    "-1133", "-1134", "-1135", "-1136", "-1137", "-1138", "-1139", "-1140",
                    "-1141", "-1142", "-1144", "-1145", "-1149", "-2010", "-2011",
                ],
                ErrorKind::InvalidOrder,
            )
            .exact("-1121", ErrorKind::BadSymbol)
            .exact("-1131", ErrorKind::InsufficientFunds)
            .exact_all(&["-1143", "-2013"], ErrorKind::OrderNotFound)
            .exact("-1187", ErrorKind::InvalidAddress);
        Self { table }
    }
}

impl Default for HbtcErrors {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier for HbtcErrors {
    fn check(&self, response: &ResponseContext<'_>) -> Result<(), ExchangeError> {
        let Some(code) = response.json.and_then(|json| get_string(json, "code")) else {
            return Ok(());
        };
        if code == "0" {
            return Ok(());
        }
        let kind = self
            .table
            .classify(&[code.as_str()])
            .unwrap_or(ErrorKind::Exchange);
        Err(response.error(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn classify(status: u16, body: &Value) -> Result<(), ExchangeError> {
        let text = body.to_string();
        HbtcErrors::new().check(&ResponseContext {
            exchange: "hbtc",
            status,
            body: &text,
            json: Some(body),
        })
    }

    #[test]
    fn test_numeric_and_string_codes() {
        let err = classify(400, &json!({"code": -1121, "msg": "Invalid symbol."})).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::BadSymbol));

        let err = classify(400, &json!({"code": "-1131", "msg": "Balance insufficient"}))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InsufficientFunds));
        assert!(err.feedback().unwrap_or_default().contains("Balance insufficient"));
    }

    #[test]
    fn test_recorded_codes() {
        let cases = [
            ("-1022", ErrorKind::Authentication),
            ("-1003", ErrorKind::RateLimited),
            ("-1021", ErrorKind::BadRequest),
            ("-1143", ErrorKind::OrderNotFound),
            ("-2013", ErrorKind::OrderNotFound),
            ("-1139", ErrorKind::InvalidOrder),
            ("-1146", ErrorKind::ExchangeNotAvailable),
            ("-1187", ErrorKind::InvalidAddress),
            ("-9999", ErrorKind::Exchange),
        ];
        for (code, expected) in cases {
            let err = classify(400, &json!({"code": code, "msg": "x"})).unwrap_err();
            assert_eq!(err.kind(), Some(expected), "{}", code);
        }
    }

    #[test]
    fn test_zero_code_and_plain_payloads_pass() {
        assert!(classify(200, &json!({"code": 0})).is_ok());
        assert!(classify(200, &json!({"serverTime": 1_527_777_538_000_i64})).is_ok());
        assert!(classify(200, &json!([{"symbol": "BTCUSDT"}])).is_ok());
    }
}
