//! Stateless CSRF protection for the sign-in redirect.
//!
//! The `state` parameter is `<nonce>.<expires_at>.<mac>` where the mac is
//! HMAC-SHA256 over `<nonce>.<expires_at>` keyed by the session secret.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const STATE_TTL_SECS: i64 = 600;

pub fn issue_state(secret: &str, now: DateTime<Utc>) -> String {
    let mut nonce = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut nonce);

    let payload = format!(
        "{}.{}",
        hex::encode(nonce),
        (now + Duration::seconds(STATE_TTL_SECS)).timestamp()
    );
    let mac = sign(secret, &payload);
    format!("{}.{}", payload, mac)
}

/// True when the state was issued with `secret` and has not expired.
pub fn verify_state(secret: &str, state: &str, now: DateTime<Utc>) -> bool {
    let Some((payload, mac_hex)) = state.rsplit_once('.') else {
        return false;
    };
    let Some((_, expires_at)) = payload.split_once('.') else {
        return false;
    };
    let Ok(expires_at) = expires_at.parse::<i64>() else {
        return false;
    };
    if now.timestamp() > expires_at {
        return false;
    }
    let Ok(mac_bytes) = hex::decode(mac_hex) else {
        return false;
    };

    let mut mac = new_mac(secret);
    mac.update(payload.as_bytes());
    mac.verify_slice(&mac_bytes).is_ok()
}

fn sign(secret: &str, payload: &str) -> String {
    let mut mac = new_mac(secret);
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn new_mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC takes keys of any size")
}
