use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Authentication middleware for the protected API surface.
///
/// Two credentials are accepted:
/// - `Authorization: Bearer <token>` matching the `API_TOKEN` env var
/// - `X-Telegram-Init-Data: <initData>` whose signature verifies against
///   `TELEGRAM_BOT_TOKEN` (requests coming from the Telegram Mini App)
///
/// If `API_TOKEN` is empty / unset, authentication is disabled (dev mode).
pub async fn require_auth(req: Request, next: Next) -> Response {
    let expected = std::env::var("API_TOKEN").unwrap_or_default();

    // No token configured → auth disabled (dev / legacy mode)
    if expected.is_empty() {
        return next.run(req).await;
    }

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    if let Some(value) = auth_header {
        if value.starts_with("Bearer ") {
            let token = &value[7..];
            if token == expected {
                return next.run(req).await;
            }
            return (StatusCode::UNAUTHORIZED, "Invalid token").into_response();
        }
    }

    let init_data = req
        .headers()
        .get("x-telegram-init-data")
        .and_then(|v| v.to_str().ok());

    if let Some(data) = init_data {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if !bot_token.is_empty() && validate_init_data(data, &bot_token) {
            return next.run(req).await;
        }
        return (StatusCode::UNAUTHORIZED, "Invalid Telegram init data").into_response();
    }

    (StatusCode::UNAUTHORIZED, "Missing or invalid Authorization header").into_response()
}

/// Validates a Telegram WebApp `initData` query string.
///
/// The `hash` field must equal
/// `HMAC_SHA256(data_check_string, HMAC_SHA256(bot_token, "WebAppData"))`
/// in hex, where `data_check_string` is every other field as `key=value`,
/// sorted by key, joined with newlines. Field values are compared in
/// percent-decoded form.
pub fn validate_init_data(init_data: &str, bot_token: &str) -> bool {
    let mut fields: Vec<(String, String)> = Vec::new();
    let mut received_hash: Option<String> = None;

    for (key, value) in url::form_urlencoded::parse(init_data.as_bytes()) {
        if key == "hash" {
            received_hash = Some(value.into_owned());
        } else {
            fields.push((key.into_owned(), value.into_owned()));
        }
    }
    let Some(received_hash) = received_hash else {
        return false;
    };

    fields.sort();
    let data_check_string = fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");

    let Ok(mut secret) = HmacSha256::new_from_slice(b"WebAppData") else {
        return false;
    };
    secret.update(bot_token.as_bytes());
    let secret_key = secret.finalize().into_bytes();

    let Ok(mut mac) = HmacSha256::new_from_slice(&secret_key) else {
        return false;
    };
    mac.update(data_check_string.as_bytes());

    hex::encode(mac.finalize().into_bytes()) == received_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Computes the hash Telegram would attach for the given fields.
    fn sign(fields: &[(&str, &str)], bot_token: &str) -> String {
        let mut sorted: Vec<_> = fields.to_vec();
        sorted.sort();
        let data_check_string = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut secret = HmacSha256::new_from_slice(b"WebAppData").unwrap();
        secret.update(bot_token.as_bytes());
        let secret_key = secret.finalize().into_bytes();

        let mut mac = HmacSha256::new_from_slice(&secret_key).unwrap();
        mac.update(data_check_string.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_correctly_signed_init_data() {
        let token = "12345:TEST_TOKEN";
        let hash = sign(
            &[
                ("auth_date", "1700000000"),
                ("query_id", "AAE"),
                ("user", r#"{"id":42}"#),
            ],
            token,
        );
        // field order and percent-encoding as Telegram sends them
        let init_data =
            format!("query_id=AAE&user=%7B%22id%22%3A42%7D&auth_date=1700000000&hash={hash}");
        assert!(validate_init_data(&init_data, token));
    }

    #[test]
    fn rejects_tampered_fields() {
        let token = "12345:TEST_TOKEN";
        let hash = sign(&[("auth_date", "1700000000"), ("query_id", "AAE")], token);
        let init_data = format!("query_id=AAE&auth_date=1700009999&hash={hash}");
        assert!(!validate_init_data(&init_data, token));
    }

    #[test]
    fn rejects_wrong_bot_token() {
        let hash = sign(&[("auth_date", "1700000000")], "12345:TEST_TOKEN");
        let init_data = format!("auth_date=1700000000&hash={hash}");
        assert!(!validate_init_data(&init_data, "67890:OTHER_TOKEN"));
    }

    #[test]
    fn rejects_missing_hash() {
        assert!(!validate_init_data("auth_date=1700000000", "12345:TEST_TOKEN"));
    }
}
