//! Identifier and timestamp generation.
//!
//! Ids are `<prefix>_<7 random base-36 chars><last 4 base-36 chars of the
//! current unix millis>`. They are unique enough for a single-user store,
//! not for anything security related.

use chrono::{SecondsFormat, Utc};
use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_LEN: usize = 7;
const TIME_LEN: usize = 4;

/// Generate a new identifier with the given prefix.
pub fn gen_id(prefix: &str) -> String {
    let mut rng = rand::rng();
    let random: String = (0..RANDOM_LEN)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect();

    let millis = Utc::now().timestamp_millis().unsigned_abs();
    let time = to_base36(millis);
    let time = &time[time.len().saturating_sub(TIME_LEN)..];

    format!("{prefix}_{random}{time}")
}

/// Current time as an ISO-8601 string, e.g. `2026-10-19T08:15:30.123Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_296), "100");
    }

    #[test]
    fn gen_id_shape() {
        let id = gen_id("inv");
        let (prefix, body) = id.split_once('_').unwrap();
        assert_eq!(prefix, "inv");
        assert_eq!(body.len(), RANDOM_LEN + TIME_LEN);
        assert!(body.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn gen_id_does_not_repeat() {
        let ids: HashSet<_> = (0..1_000).map(|_| gen_id("user")).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn now_iso_is_rfc3339_utc() {
        let now = now_iso();
        assert!(now.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
    }
}
