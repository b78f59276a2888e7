use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash a password to the format stored in `config.json` (lowercase hex SHA-256).
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// The shared secret that gates file deletion.
///
/// Holds only the hash; plain passwords never outlive a single check.
#[derive(Clone)]
pub struct Credential {
    password_hash: String,
}

impl Credential {
    /// `password_hash` must be 64 hex digits; case is ignored.
    pub fn from_hash(password_hash: &str) -> Option<Self> {
        let normalized = password_hash.trim().to_ascii_lowercase();
        if normalized.len() != 64 || hex::decode(&normalized).is_err() {
            return None;
        }
        Some(Self {
            password_hash: normalized,
        })
    }

    pub fn from_password(password: &str) -> Self {
        Self {
            password_hash: hash_password(password),
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        let candidate = hash_password(password);
        candidate
            .as_bytes()
            .ct_eq(self.password_hash.as_bytes())
            .into()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("password_hash", &"[redacted]")
            .finish()
    }
}
