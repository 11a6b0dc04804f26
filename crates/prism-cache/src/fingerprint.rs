//! The translation fingerprint: a SHA-256 over every input that affects
//! the output. An explicitly supplied source version and an inferred one
//! hash differently (the inference sentinel), so they can never collide.

use prism_catalog::{Stage, Version};
use sha2::{Digest, Sha256};
use std::fmt;

/// Marker hashed in place of the source version when the caller asked for
/// detection; outside the valid version-code range.
const DETECT_SENTINEL: u16 = 0xFFFF;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn compute(
        source: &str,
        stage: Stage,
        source_version: Option<Version>,
        target_version: Version,
        optimization_level: u8,
        strict: bool,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update([stage.ordinal()]);
        let sv = source_version.map(|v| v.code()).unwrap_or(DETECT_SENTINEL);
        hasher.update(sv.to_le_bytes());
        hasher.update(target_version.code().to_le_bytes());
        hasher.update([optimization_level, strict as u8]);
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// First 8 bytes as hex; the disk-cache file name.
    pub fn short_hex(&self) -> String {
        self.0[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(source: &str, sv: Option<Version>) -> Fingerprint {
        Fingerprint::compute(source, Stage::Fragment, sv, Version::V330, 1, false)
    }

    #[test]
    fn identical_inputs_agree() {
        assert_eq!(fp("void main() {}", None), fp("void main() {}", None));
    }

    #[test]
    fn every_component_matters() {
        let base = Fingerprint::compute("x", Stage::Fragment, None, Version::V330, 1, false);
        assert_ne!(
            base,
            Fingerprint::compute("y", Stage::Fragment, None, Version::V330, 1, false)
        );
        assert_ne!(
            base,
            Fingerprint::compute("x", Stage::Vertex, None, Version::V330, 1, false)
        );
        assert_ne!(
            base,
            Fingerprint::compute("x", Stage::Fragment, None, Version::V150, 1, false)
        );
        assert_ne!(
            base,
            Fingerprint::compute("x", Stage::Fragment, None, Version::V330, 2, false)
        );
        assert_ne!(
            base,
            Fingerprint::compute("x", Stage::Fragment, None, Version::V330, 1, true)
        );
    }

    #[test]
    fn explicit_and_inferred_source_versions_differ() {
        assert_ne!(fp("void main() {}", None), fp("void main() {}", Some(Version::V110)));
    }

    #[test]
    fn short_hex_is_sixteen_chars() {
        let f = fp("abc", None);
        assert_eq!(f.short_hex().len(), 16);
        assert_eq!(f.hex().len(), 64);
        assert!(f.hex().starts_with(&f.short_hex()));
    }
}
