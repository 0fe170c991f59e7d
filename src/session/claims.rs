// Unverified decoding of the credential's claims payload.
//
// The client never checks the signature; that is the server's job. All it
// needs is the payload segment for display and privilege gating, so any
// structural problem degrades to "no claims" rather than an error.
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Claims carried in the credential payload, as issued by the backend at
/// login. Every field is optional: a token minted by an older server (or a
/// garbage token) must still decode to something usable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub uid: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub privileges: Option<PrivilegeClaim>,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// The `privileges` claim as it appears on the wire: a number, a numeric
/// string, or something else entirely (which counts as no privileges).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PrivilegeClaim {
    Number(i64),
    Text(String),
    Other(serde_json::Value),
}

impl Claims {
    /// Numeric privilege level, defaulting to 0 for anything that is not a
    /// number or a parseable numeric string.
    pub fn privilege_level(&self) -> i64 {
        match &self.privileges {
            Some(PrivilegeClaim::Number(n)) => *n,
            Some(PrivilegeClaim::Text(s)) => s.trim().parse().unwrap_or(0),
            Some(PrivilegeClaim::Other(_)) | None => 0,
        }
    }

    /// Display name: username when present, otherwise the subject claim.
    pub fn display_name(&self) -> Option<&str> {
        self.username.as_deref().or(self.sub.as_deref())
    }

    /// Expiry as a timestamp, when the claim is present and valid.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Decode the claims payload of a credential.
///
/// The token must have at least two period-separated segments; the second is
/// base64url-decoded (padding tolerated, standard alphabet accepted as a
/// fallback) and parsed as JSON. Any failure yields `None`, never an error.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    let trimmed = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn token_with_payload(payload: &str) -> String {
        format!("header.{}.signature", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn decodes_numeric_privileges() {
        let token = token_with_payload(r#"{"privileges": 2, "sub": "user"}"#);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.privilege_level(), 2);
        assert_eq!(claims.sub.as_deref(), Some("user"));
    }

    #[test]
    fn decodes_string_privileges() {
        let token = token_with_payload(r#"{"privileges": "3"}"#);
        assert_eq!(decode_claims(&token).unwrap().privilege_level(), 3);
    }

    #[test]
    fn missing_privileges_default_to_zero() {
        let token = token_with_payload(r#"{"sub": "user"}"#);
        assert_eq!(decode_claims(&token).unwrap().privilege_level(), 0);
    }

    #[test]
    fn unparseable_string_privileges_default_to_zero() {
        let token = token_with_payload(r#"{"privileges": "lots"}"#);
        assert_eq!(decode_claims(&token).unwrap().privilege_level(), 0);
    }

    #[test]
    fn non_scalar_privileges_default_to_zero() {
        let token = token_with_payload(r#"{"privileges": {"level": 9}}"#);
        assert_eq!(decode_claims(&token).unwrap().privilege_level(), 0);
    }

    #[test]
    fn too_few_segments_yield_none() {
        assert_eq!(decode_claims("invalid-token"), None);
        assert_eq!(decode_claims(""), None);
    }

    #[test]
    fn non_json_payload_yields_none() {
        let token = format!("header.{}.signature", URL_SAFE_NO_PAD.encode("not json"));
        assert_eq!(decode_claims(&token), None);
    }

    #[test]
    fn invalid_base64_payload_yields_none() {
        assert_eq!(decode_claims("header.!!!.signature"), None);
    }

    #[test]
    fn padded_standard_alphabet_is_accepted() {
        // Tokens produced with plain btoa carry '+', '/' and '=' padding.
        use base64::engine::general_purpose::STANDARD;
        let token = format!(
            "header.{}.signature",
            STANDARD.encode(r#"{"privileges": 5, "username": "ops"}"#)
        );
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.privilege_level(), 5);
        assert_eq!(claims.display_name(), Some("ops"));
    }

    #[test]
    fn full_backend_claims_decode() {
        let token = token_with_payload(
            r#"{"uid": 7, "username": "admin", "privileges": 2, "exp": 1700000000, "iat": 1699913600}"#,
        );
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.uid, Some(7));
        assert_eq!(claims.display_name(), Some("admin"));
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);
    }
}
