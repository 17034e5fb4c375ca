//! AEAD encryption for token plaintext at rest (spec.md §4.F). Grounded
//! on `pagi-core::knowledge::vault::SecretVault`: AES-256-GCM, a
//! 12-byte `OsRng` nonce per record, wire format `[nonce || ciphertext]`.
//! Unlike the teacher's vault (locked when no key is configured), this
//! vault always has a key: `clodo-secrets` writes one to disk on first
//! use (spec.md §6's `.secure-tokens/.token-key`, mode 0600) rather than
//! reading it from an environment variable.

use crate::error::SecretError;
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use std::path::Path;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// An encrypted record as stored in `tokens.json`: ciphertext, iv and
/// auth tag laid out the way spec.md §3's Token Record shape names them
/// individually, even though `aes-gcm` appends the tag to the
/// ciphertext internally.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EncryptedPayload {
    pub ciphertext_with_tag: String,
    pub iv: String,
}

pub struct Vault {
    cipher: Aes256Gcm,
}

impl Vault {
    fn new(key: [u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new_from_slice(&key).expect("key length is 32"),
        }
    }

    /// Loads the key from `key_path`, generating and persisting a new
    /// one (mode 0600) if absent.
    pub fn open_or_create(key_path: &Path) -> Result<Self, SecretError> {
        if let Some(parent) = key_path.parent() {
            std::fs::create_dir_all(parent)?;
            set_dir_mode_0700(parent)?;
        }

        if key_path.exists() {
            let raw = std::fs::read(key_path)?;
            let key: [u8; KEY_LEN] = raw
                .try_into()
                .map_err(|_| SecretError::CorruptBlob)?;
            return Ok(Self::new(key));
        }

        let mut key = [0u8; KEY_LEN];
        use aes_gcm::aead::rand_core::RngCore;
        OsRng.fill_bytes(&mut key);
        std::fs::write(key_path, key)?;
        set_file_mode_0600(key_path)?;
        Ok(Self::new(key))
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedPayload, SecretError> {
        let nonce = Aes256Gcm::generate_nonce(OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;
        Ok(EncryptedPayload {
            ciphertext_with_tag: hex::encode(ciphertext),
            iv: hex::encode(nonce),
        })
    }

    pub fn decrypt(&self, payload: &EncryptedPayload) -> Result<Vec<u8>, SecretError> {
        let iv = hex::decode(&payload.iv).map_err(|_| SecretError::CorruptBlob)?;
        if iv.len() != NONCE_LEN {
            return Err(SecretError::CorruptBlob);
        }
        let nonce = Nonce::from_slice(&iv);
        let ciphertext = hex::decode(&payload.ciphertext_with_tag).map_err(|_| SecretError::CorruptBlob)?;
        self.cipher
            .decrypt(nonce, ciphertext.as_slice())
            .map_err(|e| SecretError::DecryptionFailed(e.to_string()))
    }

    pub fn encrypt_str(&self, plaintext: &str) -> Result<EncryptedPayload, SecretError> {
        self.encrypt(plaintext.as_bytes())
    }

    pub fn decrypt_str(&self, payload: &EncryptedPayload) -> Result<String, SecretError> {
        let bytes = self.decrypt(payload)?;
        String::from_utf8(bytes).map_err(|e| SecretError::DecryptionFailed(e.to_string()))
    }
}

#[cfg(unix)]
fn set_file_mode_0600(path: &Path) -> Result<(), SecretError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_file_mode_0600(_path: &Path) -> Result<(), SecretError> {
    Ok(())
}

#[cfg(unix)]
fn set_dir_mode_0700(path: &Path) -> Result<(), SecretError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_dir_mode_0700(_path: &Path) -> Result<(), SecretError> {
    Ok(())
}
