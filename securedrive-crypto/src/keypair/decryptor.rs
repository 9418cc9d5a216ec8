use crate::cipher::{DecryptionHint, DecryptionShare};
use crate::codec::decimal;
use crate::errors::CryptoError;
use crate::keypair::helper::{carmichael_lambda, inverse_modulus, validate_modulus};
use crate::keypair::verifier::Verifier;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Private half of a keypair: the factorization of `N` and `λ = lcm(p-1, q-1)`.
///
/// Its only operation is [`Decryptor::compute_r_prime`]. It never sees a
/// ciphertext, only the public projection `R = C mod N`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DecryptorRecord", into = "DecryptorRecord")]
pub struct Decryptor {
    owner_id: String,
    p: BigUint,
    q: BigUint,
    n: BigUint,
    lambda: BigUint,
    /// `N⁻¹ mod λ`
    n_inv: BigUint,
}

/// Stored layout: `{"p", "q", "n", "lambda", "ownerID"}`.
#[derive(Serialize, Deserialize)]
struct DecryptorRecord {
    #[serde(with = "decimal")]
    p: BigUint,
    #[serde(with = "decimal")]
    q: BigUint,
    #[serde(with = "decimal")]
    n: BigUint,
    #[serde(with = "decimal")]
    lambda: BigUint,
    #[serde(rename = "ownerID")]
    owner_id: String,
}

impl TryFrom<DecryptorRecord> for Decryptor {
    type Error = CryptoError;

    fn try_from(record: DecryptorRecord) -> Result<Self, Self::Error> {
        Decryptor::from_parts(record.owner_id, record.p, record.q, record.n, record.lambda)
    }
}

impl From<Decryptor> for DecryptorRecord {
    fn from(decryptor: Decryptor) -> Self {
        DecryptorRecord {
            p: decryptor.p,
            q: decryptor.q,
            n: decryptor.n,
            lambda: decryptor.lambda,
            owner_id: decryptor.owner_id,
        }
    }
}

impl Decryptor {
    /// Builds the private view from the two prime factors.
    ///
    /// # Errors
    /// * `InvalidParameters` if `p == q` or a factor is below 3
    /// * `NoModularInverse` if `gcd(N, λ) ≠ 1`
    pub fn try_with(owner_id: impl Into<String>, p: BigUint, q: BigUint) -> Result<Self, CryptoError> {
        if p == q {
            return Err(CryptoError::InvalidParameters(
                "p and q must be distinct".to_string(),
            ));
        }

        let lambda = carmichael_lambda(&p, &q)?;
        let n = &p * &q;
        validate_modulus(&n)?;
        let n_inv = inverse_modulus(&n, &lambda)?;

        Ok(Self {
            owner_id: owner_id.into(),
            p,
            q,
            n,
            lambda,
            n_inv,
        })
    }

    /// Rebuilds a decryptor from a stored record and checks that its parts agree.
    pub fn from_parts(
        owner_id: impl Into<String>,
        p: BigUint,
        q: BigUint,
        n: BigUint,
        lambda: BigUint,
    ) -> Result<Self, CryptoError> {
        let decryptor = Self::try_with(owner_id, p, q)?;
        if decryptor.n != n {
            return Err(CryptoError::InvalidParameters(
                "stored n does not equal p·q".to_string(),
            ));
        }
        if decryptor.lambda != lambda {
            return Err(CryptoError::InvalidParameters(
                "stored lambda does not equal lcm(p-1, q-1)".to_string(),
            ));
        }

        Ok(decryptor)
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    /// The public view of the same keypair.
    pub fn verifier(&self) -> Result<Verifier, CryptoError> {
        Verifier::try_with(self.owner_id.clone(), self.n.clone())
    }

    /// `R' = R^(N⁻¹ mod λ) mod N`.
    ///
    /// For `C = (1 + m·N)·r^N`, `R = r^N mod N` and therefore `R' = r mod N`: the
    /// decryptor strips the randomness without learning `m`.
    ///
    /// # Errors
    /// `InvalidParameters` if `R ≥ N`.
    pub fn compute_r_prime(&self, hint: &DecryptionHint) -> Result<DecryptionShare, CryptoError> {
        let r = hint.value();
        if r >= &self.n {
            return Err(CryptoError::InvalidParameters(
                "R must be reduced modulo N".to_string(),
            ));
        }

        let r_prime = r.modpow(&self.n_inv, &self.n);
        log::trace!("decryptor {}: R = {}, R' = {}", self.owner_id, r, r_prime);

        Ok(DecryptionShare::new(r_prime))
    }
}

impl fmt::Debug for Decryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decryptor")
            .field("owner_id", &self.owner_id)
            .field("n", &self.n)
            .field("p", &"<redacted>")
            .field("q", &"<redacted>")
            .field("lambda", &"<redacted>")
            .finish()
    }
}
