//! Ciphertexts and the public values exchanged by the two-party decryption.

use crate::codec::{decimal, parse_decimal, to_decimal};
use crate::errors::CryptoError;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use std::fmt;

/// One encrypted scalar, an element of Z_{N²}.
///
/// The integer is deliberately not exposed: the only arithmetic allowed on a
/// ciphertext is the set of homomorphic operators on [`crate::keypair::Verifier`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ciphertext(#[serde(with = "decimal")] BigUint);

impl Ciphertext {
    pub(crate) fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub(crate) fn value(&self) -> &BigUint {
        &self.0
    }

    /// Loads a ciphertext stored as a decimal string. Range checks against a
    /// modulus happen when a verifier operates on it.
    pub fn from_decimal(value: &str) -> Result<Self, CryptoError> {
        parse_decimal(value).map(Self)
    }

    /// Size of the encoded integer in bytes.
    pub fn size_bytes(&self) -> usize {
        self.0.to_bytes_be().len()
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_decimal(&self.0))
    }
}

/// `R = C mod N`, computed by the verifier and handed to the decryptor.
/// Public: it reveals nothing beyond what the ciphertext already does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecryptionHint(#[serde(with = "decimal")] BigUint);

impl DecryptionHint {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn from_decimal(value: &str) -> Result<Self, CryptoError> {
        parse_decimal(value).map(Self)
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Display for DecryptionHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_decimal(&self.0))
    }
}

/// `R' = R^(N⁻¹ mod λ) mod N`, the decryptor's answer to a [`DecryptionHint`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecryptionShare(#[serde(with = "decimal")] BigUint);

impl DecryptionShare {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn from_decimal(value: &str) -> Result<Self, CryptoError> {
        parse_decimal(value).map(Self)
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Display for DecryptionShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_decimal(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ciphertext_is_a_json_string() -> Result<(), CryptoError> {
        let ct = Ciphertext::from_decimal("123456789012345678901234567890")?;
        let json = serde_json::to_string(&ct)?;
        assert_eq!(json, r#""123456789012345678901234567890""#);
        assert_eq!(serde_json::from_str::<Ciphertext>(&json)?, ct);
        assert_eq!(ct.to_string(), "123456789012345678901234567890");
        Ok(())
    }

    #[test]
    fn test_share_rejects_garbage() {
        assert!(DecryptionShare::from_decimal("12.5").is_err());
        assert!(serde_json::from_str::<DecryptionHint>(r#""abc""#).is_err());
    }
}
