//! ChaCha20-Poly1305 envelope for vault entries.
//!
//! Format: `enc2:` + base64(nonce ‖ ciphertext ‖ tag), with a fresh random
//! 12-byte nonce per encryption.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Nonce,
};
use sha2::{Digest, Sha256};

use super::VaultError;

const ENCRYPTED_PREFIX: &str = "enc2:";
const NONCE_SIZE: usize = 12;

pub struct VaultCipher {
    cipher: ChaCha20Poly1305,
}

impl VaultCipher {
    /// Per-user cipher keyed by SHA-256 of `"{user_id}:{secret}"`.
    pub fn for_user(user_id: &str, secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("{user_id}:{secret}").as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&hasher.finalize());
        Self {
            cipher: ChaCha20Poly1305::new(&key.into()),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::EncryptionFailed)?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);
        Ok(format!("{ENCRYPTED_PREFIX}{}", BASE64.encode(&combined)))
    }

    pub fn decrypt(&self, encrypted: &str) -> Result<String, VaultError> {
        let encoded = encrypted
            .strip_prefix(ENCRYPTED_PREFIX)
            .ok_or(VaultError::InvalidFormat)?;
        let combined = BASE64
            .decode(encoded)
            .map_err(|_| VaultError::InvalidFormat)?;
        if combined.len() < NONCE_SIZE {
            return Err(VaultError::InvalidFormat);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| VaultError::DecryptionFailed)?;

        String::from_utf8(plaintext).map_err(|_| VaultError::InvalidFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let cipher = VaultCipher::for_user("a1b2c3d4e5f60718", "server-secret");
        let encrypted = cipher.encrypt("I never told anyone about the letter").unwrap();
        assert!(encrypted.starts_with(ENCRYPTED_PREFIX));
        assert_eq!(
            cipher.decrypt(&encrypted).unwrap(),
            "I never told anyone about the letter"
        );
    }

    #[test]
    fn fresh_nonce_per_encryption() {
        let cipher = VaultCipher::for_user("u1", "k");
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a).unwrap(), cipher.decrypt(&b).unwrap());
    }

    #[test]
    fn other_users_key_cannot_decrypt() {
        let mine = VaultCipher::for_user("u1", "k");
        let theirs = VaultCipher::for_user("u2", "k");
        let encrypted = mine.encrypt("secret").unwrap();
        assert!(matches!(
            theirs.decrypt(&encrypted),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let cipher = VaultCipher::for_user("u1", "k");
        let encrypted = cipher.encrypt("secret").unwrap();
        let mut bytes = BASE64
            .decode(encrypted.strip_prefix(ENCRYPTED_PREFIX).unwrap())
            .unwrap();
        if let Some(last) = bytes.last_mut() {
            *last ^= 0xFF;
        }
        let tampered = format!("{ENCRYPTED_PREFIX}{}", BASE64.encode(&bytes));
        assert!(matches!(
            cipher.decrypt(&tampered),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn malformed_envelopes_are_invalid_format() {
        let cipher = VaultCipher::for_user("u1", "k");
        for input in ["plain text", "enc2:!!!not-base64!!!", "enc2:AAAA"] {
            assert!(
                matches!(cipher.decrypt(input), Err(VaultError::InvalidFormat)),
                "{input}"
            );
        }
    }

    #[test]
    fn unicode_roundtrip() {
        let cipher = VaultCipher::for_user("u1", "k");
        let text = "Je t'aime 💌 ずっと";
        assert_eq!(cipher.decrypt(&cipher.encrypt(text).unwrap()).unwrap(), text);
    }
}
