//! Challenge-response authentication (command 0x2F).
//!
//! The host writes a 20-byte challenge and reads back HMAC-SHA1 of it,
//! keyed with the pack's 16-byte secret.

use crate::config::AuthKey;
use crate::constants::{AUTH_KEY_LEN, CHALLENGE_LEN};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// 20-byte challenge written by the host
pub type Challenge = [u8; CHALLENGE_LEN];

/// 20-byte digest returned to the host
pub type Response = [u8; CHALLENGE_LEN];

/// Compute the response to a challenge
pub fn authenticate(key: &AuthKey, challenge: &Challenge) -> Response {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(challenge);
    let digest = mac.finalize().into_bytes();

    let mut response = [0u8; CHALLENGE_LEN];
    response.copy_from_slice(&digest);
    response
}

/// One quarter of the key, as served by the read-back commands 0x63-0x66
pub fn key_word(key: &AuthKey, index: u8) -> Option<[u8; 4]> {
    let start = index as usize * 4;
    if start + 4 > AUTH_KEY_LEN {
        return None;
    }
    let mut word = [0u8; 4];
    word.copy_from_slice(&key[start..start + 4]);
    Some(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BatteryConfig;

    fn counting_challenge() -> Challenge {
        let mut challenge = [0u8; CHALLENGE_LEN];
        for (i, byte) in challenge.iter_mut().enumerate() {
            *byte = i as u8;
        }
        challenge
    }

    #[test]
    fn known_response() {
        let key = BatteryConfig::default().auth_key;
        let response = authenticate(&key, &counting_challenge());
        assert_eq!(
            response,
            [
                0x4b, 0xf5, 0x7c, 0xe2, 0x69, 0xe3, 0xf0, 0x11, 0xdf, 0x03, 0xc3, 0xc0, 0xab, 0x2a,
                0xc0, 0xd1, 0x9e, 0x1e, 0x5c, 0xae
            ]
        );
    }

    #[test]
    fn response_depends_on_key() {
        let key = BatteryConfig::default().auth_key;
        let mut other = key;
        other[15] ^= 0x01;
        let challenge = counting_challenge();
        assert_eq!(authenticate(&key, &challenge), authenticate(&key, &challenge));
        assert_ne!(authenticate(&key, &challenge), authenticate(&other, &challenge));
    }

    #[test]
    fn key_words_cover_the_key() {
        let key = BatteryConfig::default().auth_key;
        assert_eq!(key_word(&key, 0), Some([0x10, 0x32, 0x54, 0x76]));
        assert_eq!(key_word(&key, 3), Some([0x67, 0x45, 0x23, 0x01]));
        assert_eq!(key_word(&key, 4), None);

        let joined: Vec<u8> = (0..4).flat_map(|i| key_word(&key, i).unwrap()).collect();
        assert_eq!(joined, key);
    }
}
