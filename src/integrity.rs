//! Subresource-integrity style body validation
//!
//! A token is `<algorithm>-<base64 digest>`; base64 has no `-`, so the
//! last dash splits it. The whole body is hashed and the encoded digest
//! must equal the token's exactly.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    /// Accepts `sha1`, `SHA-1`, `sha256`, `SHA-256`, ...
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(Error::UnsupportedAlgorithm(name.to_string())),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Base64 digest of the chunks, hashed in order
    pub fn digest(self, chunks: &[Bytes]) -> String {
        match self {
            Self::Sha1 => encode::<Sha1>(chunks),
            Self::Sha256 => encode::<Sha256>(chunks),
            Self::Sha384 => encode::<Sha384>(chunks),
            Self::Sha512 => encode::<Sha512>(chunks),
        }
    }
}

fn encode<D: Digest>(chunks: &[Bytes]) -> String {
    let mut hasher = D::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    STANDARD.encode(hasher.finalize())
}

/// Validate `chunks` against `token` and return them joined
///
/// Without a token the chunks pass through unchecked.
pub fn validate(token: Option<&str>, chunks: &[Bytes]) -> Result<Bytes, Error> {
    if let Some(token) = token {
        let token = token.trim();
        let (name, expected) = token
            .rsplit_once('-')
            .filter(|(name, _)| !name.is_empty())
            .ok_or_else(|| Error::UnsupportedAlgorithm(token.to_string()))?;

        let algorithm = Algorithm::parse(name)?;
        let actual = algorithm.digest(chunks);
        if actual != expected {
            return Err(Error::IntegrityMismatch {
                algorithm: algorithm.name(),
                expected: expected.to_string(),
                actual,
            });
        }
    }

    Ok(join(chunks))
}

fn join(chunks: &[Bytes]) -> Bytes {
    match chunks {
        [] => Bytes::new(),
        [single] => single.clone(),
        many => Bytes::from(many.concat()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha1("test")
    const TEST_SHA1: &str = "qUqP5cyxm6YcTAhz05Hph5gvu9M=";

    #[test]
    fn test_no_token_passes_through() {
        let chunks = [Bytes::from("te"), Bytes::from("st")];
        assert_eq!(validate(None, &chunks).unwrap(), "test");
    }

    #[test]
    fn test_valid_digest() {
        let token = format!("sha1-{TEST_SHA1}");
        let chunks = [Bytes::from("te"), Bytes::from("st")];
        assert_eq!(validate(Some(&token), &chunks).unwrap(), "test");

        let token = format!("SHA-1-{TEST_SHA1}");
        assert!(validate(Some(&token), &[Bytes::from("test")]).is_ok());
    }

    #[test]
    fn test_mismatch() {
        let err = validate(Some("sha256-AAAA"), &[Bytes::from("test")]).unwrap_err();
        assert!(matches!(
            err,
            Error::IntegrityMismatch {
                algorithm: "SHA-256",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_algorithm() {
        let err = validate(Some("md5-AAAA"), &[Bytes::from("test")]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(name) if name == "md5"));

        assert!(matches!(
            validate(Some("nodash"), &[]),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_digest_lengths() {
        let chunks = [Bytes::from("test")];
        assert_eq!(Algorithm::Sha256.digest(&chunks).len(), 44);
        assert_eq!(Algorithm::Sha384.digest(&chunks).len(), 64);
        assert_eq!(Algorithm::Sha512.digest(&chunks).len(), 88);
    }
}
