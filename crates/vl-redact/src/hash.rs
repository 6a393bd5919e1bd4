//! Content digests and keyed audit seals.
//!
//! Documents are identified by a SHA-256 digest of their UTF-8 bytes. Audit
//! logs may additionally carry an HMAC-SHA256 seal computed with key material
//! managed by [`KeyManager`].

use crate::error::{RedactError, Result};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Algorithm name recorded in audit seals and key files.
pub const SEAL_ALGORITHM: &str = "hmac-sha256";

/// Schema version for the key file.
pub const KEY_FILE_SCHEMA_VERSION: &str = "1.0.0";

/// Compute the lowercase hex SHA-256 digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Whether `value` has the shape of a [`content_hash`] output.
pub fn is_content_hash(value: &str) -> bool {
    value.len() == 64
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Key material for HMAC-SHA256 audit seals.
#[derive(Clone)]
pub struct KeyMaterial {
    key: [u8; 32],
    /// Key identifier recorded in seals.
    pub key_id: String,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl KeyMaterial {
    /// Create new key material with a random key.
    pub fn generate(key_id: &str) -> Result<Self> {
        let mut key = [0u8; 32];
        getrandom::getrandom(&mut key).map_err(|e| {
            RedactError::KeyError(format!("failed to generate random key: {}", e))
        })?;
        Ok(Self {
            key,
            key_id: key_id.to_string(),
        })
    }

    /// Create key material from raw bytes.
    pub fn from_bytes(key: [u8; 32], key_id: &str) -> Self {
        Self {
            key,
            key_id: key_id.to_string(),
        }
    }

    /// Create key material from a base64-encoded string.
    pub fn from_base64(encoded: &str, key_id: &str) -> Result<Self> {
        use base64::Engine;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| RedactError::KeyError(format!("invalid base64: {}", e)))?;

        let key: [u8; 32] = decoded.as_slice().try_into().map_err(|_| {
            RedactError::KeyError(format!("key must be 32 bytes, got {}", decoded.len()))
        })?;

        Ok(Self {
            key,
            key_id: key_id.to_string(),
        })
    }

    /// Export key material as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(self.key)
    }

    fn mac(&self) -> Result<Hmac<Sha256>> {
        Hmac::<Sha256>::new_from_slice(&self.key)
            .map_err(|e| RedactError::KeyError(format!("invalid hmac key: {}", e)))
    }

    /// Compute the hex HMAC-SHA256 of `data`.
    pub fn sign(&self, data: &[u8]) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(data);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check a hex HMAC-SHA256 tag in constant time.
    pub fn verify(&self, data: &[u8], tag_hex: &str) -> Result<bool> {
        let Ok(tag) = hex::decode(tag_hex) else {
            return Ok(false);
        };
        let mut mac = self.mac()?;
        mac.update(data);
        Ok(mac.verify_slice(&tag).is_ok())
    }
}

/// Key manager for loading and storing seal keys.
///
/// Rotation deprecates the active key but keeps it, so logs sealed before the
/// rotation still verify.
#[derive(Serialize, Deserialize)]
pub struct KeyManager {
    /// Schema version for the key file.
    pub schema_version: String,
    /// Key entries by id.
    pub keys: BTreeMap<String, KeyEntry>,
    /// Currently active key ID.
    pub active_key_id: String,
}

/// Entry in the key file.
#[derive(Serialize, Deserialize)]
pub struct KeyEntry {
    /// When this key was created.
    pub created_at: String,
    /// Algorithm (always hmac-sha256).
    pub algorithm: String,
    /// Base64-encoded key material.
    pub key_material: String,
    /// Key status (active, deprecated).
    pub status: String,
}

impl KeyEntry {
    fn active(key: &KeyMaterial) -> Self {
        Self {
            created_at: chrono::Utc::now().to_rfc3339(),
            algorithm: SEAL_ALGORITHM.to_string(),
            key_material: key.to_base64(),
            status: "active".to_string(),
        }
    }
}

impl KeyManager {
    /// Create a new key manager with a fresh key.
    pub fn new() -> Result<Self> {
        let key = KeyMaterial::generate("k1")?;

        let mut keys = BTreeMap::new();
        keys.insert("k1".to_string(), KeyEntry::active(&key));

        Ok(Self {
            schema_version: KEY_FILE_SCHEMA_VERSION.to_string(),
            keys,
            active_key_id: "k1".to_string(),
        })
    }

    /// Load key manager from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manager: KeyManager = serde_json::from_str(&content)
            .map_err(|e| RedactError::KeyError(format!("malformed key file: {}", e)))?;
        if !manager.keys.contains_key(&manager.active_key_id) {
            return Err(RedactError::KeyError(format!(
                "active key '{}' not found",
                manager.active_key_id
            )));
        }
        Ok(manager)
    }

    /// Save key manager to a file with restricted permissions.
    ///
    /// On Unix, the file is created with 0600 permissions atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;

            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&path, &content)?;
        }

        Ok(())
    }

    /// Get the active key material.
    pub fn active_key(&self) -> Result<KeyMaterial> {
        self.key(&self.active_key_id)
    }

    /// Get key material by id, including deprecated keys.
    pub fn key(&self, key_id: &str) -> Result<KeyMaterial> {
        let entry = self
            .keys
            .get(key_id)
            .ok_or_else(|| RedactError::KeyError(format!("key '{}' not found", key_id)))?;

        if entry.algorithm != SEAL_ALGORITHM {
            return Err(RedactError::KeyError(format!(
                "key '{}' uses unsupported algorithm '{}'",
                key_id, entry.algorithm
            )));
        }

        KeyMaterial::from_base64(&entry.key_material, key_id)
    }

    /// Rotate to a new key.
    pub fn rotate(&mut self) -> Result<()> {
        if let Some(entry) = self.keys.get_mut(&self.active_key_id) {
            entry.status = "deprecated".to_string();
        }

        let new_id = format!("k{}", self.keys.len() + 1);
        let key = KeyMaterial::generate(&new_id)?;

        self.keys.insert(new_id.clone(), KeyEntry::active(&key));
        self.active_key_id = new_id;

        Ok(())
    }
}
