use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce, aead::Aead};
use argon2::{Argon2, password_hash::{PasswordHasher, SaltString}};
use rand::{RngCore, thread_rng};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed: {0}")]
    Encrypt(String),

    #[error("Decryption failed (wrong password or corrupted data)")]
    Decrypt,
}

/// Ciphertext as written to disk, alongside what is needed to open it again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    pub data: Vec<u8>,
    pub nonce: Vec<u8>,
    pub salt: Vec<u8>,
}

pub struct Encryption {
    cipher: Aes256Gcm,
    salt: Vec<u8>,
}

impl Encryption {
    /// Derives an AES-256 key from `password` with Argon2 over `salt`.
    pub fn new(password: &str, salt: &[u8]) -> Result<Self, EncryptionError> {
        let argon2 = Argon2::default();
        let salt_string = SaltString::encode_b64(salt)
            .map_err(|e| EncryptionError::KeyDerivation(format!("salt encoding: {}", e)))?;

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt_string)
            .map_err(|e| EncryptionError::KeyDerivation(e.to_string()))?;

        let hash = password_hash
            .hash
            .ok_or_else(|| EncryptionError::KeyDerivation("argon2 produced no output".into()))?;
        let key_bytes = hash.as_bytes();
        if key_bytes.len() < 32 {
            return Err(EncryptionError::KeyDerivation(format!(
                "derived key too short ({} bytes)",
                key_bytes.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(&key_bytes[..32]);

        Ok(Self {
            cipher: Aes256Gcm::new(key),
            salt: salt.to_vec(),
        })
    }

    /// Key derived under a freshly generated salt.
    pub fn with_new_salt(password: &str) -> Result<Self, EncryptionError> {
        Self::new(password, &generate_salt())
    }

    pub fn encrypt(&self, data: &[u8]) -> Result<EncryptedData, EncryptionError> {
        let mut nonce_bytes = [0u8; 12];
        thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let encrypted_data = self
            .cipher
            .encrypt(nonce, data)
            .map_err(|e| EncryptionError::Encrypt(e.to_string()))?;

        Ok(EncryptedData {
            data: encrypted_data,
            nonce: nonce_bytes.to_vec(),
            salt: self.salt.clone(),
        })
    }

    pub fn decrypt(&self, encrypted: &EncryptedData) -> Result<Vec<u8>, EncryptionError> {
        if encrypted.nonce.len() != 12 {
            return Err(EncryptionError::Decrypt);
        }
        let nonce = Nonce::from_slice(&encrypted.nonce);
        self.cipher
            .decrypt(nonce, encrypted.data.as_ref())
            .map_err(|_| EncryptionError::Decrypt)
    }
}

/// Encrypts `plaintext` under `password` with a fresh salt and nonce.
pub fn seal(password: &str, plaintext: &[u8]) -> Result<EncryptedData, EncryptionError> {
    Encryption::with_new_salt(password)?.encrypt(plaintext)
}

/// Opens data produced by [`seal`].
pub fn open(password: &str, encrypted: &EncryptedData) -> Result<Vec<u8>, EncryptionError> {
    Encryption::new(password, &encrypted.salt)?.decrypt(encrypted)
}

pub fn generate_salt() -> [u8; 32] {
    let mut salt = [0u8; 32];
    thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_then_open_with_same_password() {
        let sealed = seal("hunter2", b"[\"2024-01-01\"]").unwrap();
        assert_eq!(sealed.salt.len(), 32);
        assert_eq!(open("hunter2", &sealed).unwrap(), b"[\"2024-01-01\"]");
    }

    #[test]
    fn wrong_password_fails_to_open() {
        let sealed = seal("right", b"secret").unwrap();
        assert!(matches!(open("wrong", &sealed), Err(EncryptionError::Decrypt)));
    }
}
