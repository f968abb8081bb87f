use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use tracing::debug;

use crate::models::AuthError;

type HmacSha256 = Hmac<Sha256>;

const OTP_TTL_MINUTES: i64 = 5;

#[derive(Debug, Clone)]
struct OtpEntry {
    hash: String,
    expires_at: DateTime<Utc>,
}

// Process-wide cache keyed by phone number. Codes are short-lived and only
// one server instance fronts the store, so no external cache is involved.
static OTP_STORE: LazyLock<Mutex<HashMap<String, OtpEntry>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

pub fn generate_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(1000..10000);
    code.to_string()
}

fn hash_code(code: &str, secret: &str) -> Result<String, AuthError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AuthError::Token("Failed to create HMAC".to_string()))?;
    mac.update(code.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

pub fn store_code(phone_number: &str, code: &str, secret: &str) -> Result<(), AuthError> {
    let entry = OtpEntry {
        hash: hash_code(code, secret)?,
        expires_at: Utc::now() + Duration::minutes(OTP_TTL_MINUTES),
    };

    let mut store = OTP_STORE
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    store.insert(phone_number.to_string(), entry);
    Ok(())
}

/// Checks the submitted code against the cached hash. Single-use: the entry
/// is consumed whether the code matches or not, so a mismatch forces a fresh
/// OTP round trip.
pub fn verify_code(phone_number: &str, code: &str, secret: &str) -> Result<(), AuthError> {
    let mut store = OTP_STORE
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);

    let entry = match store.remove(phone_number) {
        Some(entry) if entry.expires_at > Utc::now() => entry,
        Some(_) => {
            debug!("OTP for {} expired", phone_number);
            return Err(AuthError::OtpExpired);
        }
        None => return Err(AuthError::OtpExpired),
    };

    if hash_code(code, secret)? == entry.hash {
        return Ok(());
    }

    debug!("OTP mismatch for {}, code dropped", phone_number);
    Err(AuthError::OtpInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn verify_accepts_stored_code_once() {
        store_code("+353850000001", "1234", "secret").unwrap();
        assert!(verify_code("+353850000001", "1234", "secret").is_ok());
        // Consumed on success
        assert_matches!(
            verify_code("+353850000001", "1234", "secret"),
            Err(AuthError::OtpExpired)
        );
    }

    // Single-use either way: a wrong code consumes the entry, so the right
    // code no longer works afterwards.
    #[test]
    fn verify_consumes_entry_on_mismatch() {
        store_code("+353850000002", "1234", "secret").unwrap();
        assert_matches!(
            verify_code("+353850000002", "9999", "secret"),
            Err(AuthError::OtpInvalid)
        );
        assert_matches!(
            verify_code("+353850000002", "1234", "secret"),
            Err(AuthError::OtpExpired)
        );
    }

    #[test]
    fn generated_codes_are_four_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 4);
            assert!(code.parse::<u32>().is_ok());
        }
    }
}
