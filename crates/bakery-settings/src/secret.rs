//! Secret values and secret key generation.

use std::fmt;

use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Characters eligible for generated secret keys: digits, ASCII letters,
/// punctuation and whitespace.
pub const PRINTABLE: &[u8] = b"0123456789\
abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ\
!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~ \t\n\r\x0b\x0c";

/// Length of generated secret keys.
pub const GENERATED_KEY_LEN: usize = 50;

const REDACTED: &str = "[redacted]";

/// A string that is never printed or serialized in clear text.
///
/// Deserializes from a plain string so base files can carry passwords.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the clear-text value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

/// Where the active secret key came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecretKeySource {
    /// Not resolved yet (base layer only).
    #[default]
    Unset,
    /// Supplied by `DJANGO_SECRET_KEY`.
    Environment,
    /// Generated for this process; sessions and signatures do not survive a restart.
    Ephemeral,
}

/// The application signing key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecretKey {
    value: Secret,
    source: SecretKeySource,
}

impl SecretKey {
    /// Use an externally supplied key verbatim.
    pub fn from_env(value: impl Into<String>) -> Self {
        Self {
            value: Secret::new(value),
            source: SecretKeySource::Environment,
        }
    }

    /// Generate a fresh key from the operating system CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            value: Secret::new(generate_secret_key()),
            source: SecretKeySource::Ephemeral,
        }
    }

    /// Access the clear-text key.
    pub fn expose(&self) -> &str {
        self.value.expose()
    }

    /// Where the key came from.
    pub fn source(&self) -> SecretKeySource {
        self.source
    }

    /// Whether the key was generated for this process only.
    pub fn is_ephemeral(&self) -> bool {
        self.source == SecretKeySource::Ephemeral
    }
}

/// Generate a [`GENERATED_KEY_LEN`]-character key over [`PRINTABLE`].
#[must_use]
pub fn generate_secret_key() -> String {
    let mut rng = OsRng;
    (0..GENERATED_KEY_LEN)
        .map(|_| char::from(PRINTABLE[rng.gen_range(0..PRINTABLE.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_alphabet() {
        assert_eq!(PRINTABLE.len(), 100);
        assert!(PRINTABLE.iter().all(u8::is_ascii));
        let mut sorted = PRINTABLE.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), PRINTABLE.len());
    }

    #[test]
    fn test_generated_key_shape() {
        let key = generate_secret_key();
        assert_eq!(key.chars().count(), GENERATED_KEY_LEN);
        assert!(key.bytes().all(|b| PRINTABLE.contains(&b)));
    }

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(generate_secret_key(), generate_secret_key());
    }

    #[test]
    fn test_secret_key_sources() {
        let key = SecretKey::from_env("abc");
        assert_eq!(key.expose(), "abc");
        assert_eq!(key.source(), SecretKeySource::Environment);
        assert!(!key.is_ephemeral());

        let key = SecretKey::generate();
        assert!(key.is_ephemeral());
        assert_eq!(SecretKey::default().source(), SecretKeySource::Unset);
    }

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("s3cr3t");
        assert_eq!(format!("{secret:?}"), "[redacted]");
        assert_eq!(serde_json::to_string(&secret).unwrap(), r#""[redacted]""#);

        let key = SecretKey::from_env("s3cr3t");
        assert!(!format!("{key:?}").contains("s3cr3t"));
    }

    #[test]
    fn test_secret_deserializes_clear_text() {
        let secret: Secret = serde_json::from_str(r#""p@ss""#).unwrap();
        assert_eq!(secret.expose(), "p@ss");
    }
}
