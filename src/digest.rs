use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 of the exact output text. No whitespace normalization is applied,
/// so `"42\n"` and `"42"` produce different fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

pub fn digest(text: &str) -> Fingerprint {
    Fingerprint::of(text)
}

pub fn equal(a: &Fingerprint, b: &Fingerprint) -> bool {
    a == b
}
