use crate::cipher::{Ciphertext, DecryptionHint, DecryptionShare};
use crate::codec::decimal;
use crate::errors::CryptoError;
use crate::gen_r::{RandomnessContext, derive_r, fresh_r_with};
use crate::keypair::helper::validate_modulus;
use crate::ring::ModRing;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Public half of a keypair: holds `N` and `N²` only.
///
/// A verifier encrypts, combines ciphertexts homomorphically and finishes a
/// decryption once the [`crate::keypair::Decryptor`] has answered its hint. It
/// cannot decrypt on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VerifierRecord", into = "VerifierRecord")]
pub struct Verifier {
    owner_id: String,
    /// Plaintext space Z_N
    ring_n: ModRing,
    /// Ciphertext space Z_{N²}
    ring_n2: ModRing,
}

/// Stored layout: `{"n": "...", "nsquare": "...", "ownerID": "..."}`.
#[derive(Serialize, Deserialize)]
struct VerifierRecord {
    #[serde(with = "decimal")]
    n: BigUint,
    #[serde(with = "decimal")]
    nsquare: BigUint,
    #[serde(rename = "ownerID")]
    owner_id: String,
}

impl TryFrom<VerifierRecord> for Verifier {
    type Error = CryptoError;

    fn try_from(record: VerifierRecord) -> Result<Self, Self::Error> {
        let verifier = Verifier::try_with(record.owner_id, record.n)?;
        if verifier.n_squared() != &record.nsquare {
            return Err(CryptoError::InvalidParameters(
                "nsquare does not equal n²".to_string(),
            ));
        }

        Ok(verifier)
    }
}

impl From<Verifier> for VerifierRecord {
    fn from(verifier: Verifier) -> Self {
        VerifierRecord {
            n: verifier.ring_n.modulus().clone(),
            nsquare: verifier.ring_n2.modulus().clone(),
            owner_id: verifier.owner_id,
        }
    }
}

impl Verifier {
    /// Creates the public view for `owner_id` from the modulus `N`.
    pub fn try_with(owner_id: impl Into<String>, n: BigUint) -> Result<Self, CryptoError> {
        validate_modulus(&n)?;
        let n_squared = &n * &n;

        Ok(Self {
            owner_id: owner_id.into(),
            ring_n: ModRing::try_with(n)?,
            ring_n2: ModRing::try_with(n_squared)?,
        })
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn n(&self) -> &BigUint {
        self.ring_n.modulus()
    }

    pub fn n_squared(&self) -> &BigUint {
        self.ring_n2.modulus()
    }

    /// Encrypts `m` with fresh randomness from the thread RNG.
    ///
    /// # Errors
    /// `RangeError` if `m ≥ N`.
    pub fn encrypt(&self, m: &BigUint) -> Result<Ciphertext, CryptoError> {
        self.encrypt_with_rng(m, &mut rand::rng())
    }

    /// Encrypts `m` with randomness drawn from `rng`.
    pub fn encrypt_with_rng<R: RngCore + ?Sized>(
        &self,
        m: &BigUint,
        rng: &mut R,
    ) -> Result<Ciphertext, CryptoError> {
        self.check_plaintext(m)?;
        let r = fresh_r_with(self.n(), rng)?;
        self.encrypt_with_custom_random(m, &r)
    }

    /// Encrypts `m` with randomness derived from `context`.
    ///
    /// Reproducible: the same `(m, context)` always yields the same ciphertext,
    /// so identical inputs are linkable.
    pub fn encrypt_deterministic(
        &self,
        m: &BigUint,
        context: &RandomnessContext,
    ) -> Result<Ciphertext, CryptoError> {
        self.check_plaintext(m)?;
        let r = derive_r(context, self.n())?;
        self.encrypt_with_custom_random(m, &r)
    }

    /// `C = (1 + m·N) · r^N mod N²` with a caller-supplied `r`.
    ///
    /// # Errors
    /// * `RangeError` if `m ≥ N`
    /// * `InvalidRandomness` if `r ∉ [1, N-1]` or `gcd(r, N) ≠ 1`
    pub fn encrypt_with_custom_random(
        &self,
        m: &BigUint,
        r: &BigUint,
    ) -> Result<Ciphertext, CryptoError> {
        self.check_plaintext(m)?;

        let n = self.n();
        if r.is_zero() || r >= n {
            return Err(CryptoError::InvalidRandomness(
                "r must be in the range [1, N-1]".to_string(),
            ));
        }
        if !self.ring_n.is_unit(r) {
            return Err(CryptoError::InvalidRandomness(
                "r must be coprime with N".to_string(),
            ));
        }

        // (1 + N)^m = 1 + m·N mod N²
        let g_m = self.ring_n2.normalize(&(m * n + 1u32));
        let r_n = self.ring_n2.pow(r, n);

        Ok(Ciphertext::new(self.ring_n2.mul(&g_m, &r_n)))
    }

    /// `C1 · C2 mod N²`, an encryption of `m1 + m2 mod N`.
    pub fn homomorphic_addition(
        &self,
        c1: &Ciphertext,
        c2: &Ciphertext,
    ) -> Result<Ciphertext, CryptoError> {
        let a = self.check_ciphertext(c1)?;
        let b = self.check_ciphertext(c2)?;

        Ok(Ciphertext::new(self.ring_n2.mul(a, b)))
    }

    /// Left fold of [`Self::homomorphic_addition`] starting from 1.
    ///
    /// # Errors
    /// `EmptyInput` for an empty slice: the bare identity 1 is only an encryption
    /// of 0 with `r = 1`, which is not a meaningful result.
    pub fn homomorphic_sum(&self, ciphertexts: &[Ciphertext]) -> Result<Ciphertext, CryptoError> {
        if ciphertexts.is_empty() {
            return Err(CryptoError::EmptyInput(
                "homomorphic sum needs at least one ciphertext".to_string(),
            ));
        }

        let mut acc = BigUint::one();
        for ciphertext in ciphertexts {
            acc = self.ring_n2.mul(&acc, self.check_ciphertext(ciphertext)?);
        }

        Ok(Ciphertext::new(acc))
    }

    /// `C1 · C2⁻¹ mod N²`, an encryption of `m1 - m2 mod N`.
    ///
    /// # Errors
    /// `CorruptCiphertext` if `C2` is not invertible mod `N²`.
    pub fn homomorphic_subtraction(
        &self,
        c1: &Ciphertext,
        c2: &Ciphertext,
    ) -> Result<Ciphertext, CryptoError> {
        let a = self.check_ciphertext(c1)?;
        let b = self.check_ciphertext(c2)?;

        let b_inv = self.ring_n2.inv(b).map_err(|e| {
            CryptoError::CorruptCiphertext(format!("subtrahend is not a unit mod N²: {}", e))
        })?;

        Ok(Ciphertext::new(self.ring_n2.mul(a, &b_inv)))
    }

    /// `C^α mod N²`, an encryption of `m·α mod N` for a public scalar `α`.
    pub fn homomorphic_multiplication(
        &self,
        c: &Ciphertext,
        alpha: &BigUint,
    ) -> Result<Ciphertext, CryptoError> {
        let base = self.check_ciphertext(c)?;

        Ok(Ciphertext::new(self.ring_n2.pow(base, alpha)))
    }

    /// `R = C mod N`, the only value the decryptor needs.
    pub fn compute_r(&self, c: &Ciphertext) -> Result<DecryptionHint, CryptoError> {
        let value = self.check_ciphertext(c)?;

        Ok(DecryptionHint::new(self.ring_n.normalize(value)))
    }

    /// Checks `R'^N ≡ C (mod N)` and only then recovers the plaintext.
    ///
    /// 1. Verify the share against the ciphertext.
    /// 2. `S = R'^N mod N²`, inverted mod `N²`.
    /// 3. `m = ((C · S⁻¹ mod N²) - 1) / N`, which must divide exactly.
    ///
    /// # Errors
    /// * `VerificationFailed` if the share does not belong to `C`
    /// * `CorruptCiphertext` if `S` has no inverse or the division is not exact
    pub fn verify_and_decrypt(
        &self,
        c: &Ciphertext,
        share: &DecryptionShare,
    ) -> Result<BigUint, CryptoError> {
        let value = self.check_ciphertext(c)?;
        let n = self.n();
        let r_prime = share.value();

        if r_prime.is_zero() || !self.ring_n.contains(r_prime) {
            log::warn!("decryption share for owner {} is out of range", self.owner_id);
            return Err(CryptoError::VerificationFailed);
        }

        let expected = self.ring_n.normalize(value);
        let actual = self.ring_n.pow(r_prime, n);
        log::trace!("verify: R'^N mod N = {}, C mod N = {}", actual, expected);
        if actual != expected {
            log::warn!(
                "decryption share rejected for owner {}: R'^N does not match C mod N",
                self.owner_id
            );
            return Err(CryptoError::VerificationFailed);
        }

        let s = self.ring_n2.pow(r_prime, n);
        let s_inv = self.ring_n2.inv(&s).map_err(|e| {
            CryptoError::CorruptCiphertext(format!("R'^N is not a unit mod N²: {}", e))
        })?;

        let unmasked = self.ring_n2.mul(value, &s_inv);
        if unmasked.is_zero() {
            return Err(CryptoError::CorruptCiphertext(
                "unmasked ciphertext is zero".to_string(),
            ));
        }

        let (m, remainder) = (unmasked - 1u32).div_rem(n);
        if !remainder.is_zero() {
            return Err(CryptoError::CorruptCiphertext(
                "C · S⁻¹ - 1 is not a multiple of N".to_string(),
            ));
        }

        Ok(m)
    }

    /// Centered lift of a plaintext: values above `N/2` are read as `m - N`.
    ///
    /// Homomorphic subtraction wraps negative results around `N`; this maps them
    /// back to signed integers.
    pub fn decode_signed(&self, m: &BigUint) -> BigInt {
        let n = self.n();
        let m = self.ring_n.normalize(m);
        let half = n >> 1u32;

        if m > half {
            BigInt::from_biguint(Sign::Minus, n - m)
        } else {
            BigInt::from_biguint(Sign::Plus, m)
        }
    }

    /// Encodes a signed value into `[0, N)`, the inverse of [`Self::decode_signed`].
    pub fn encode_signed(&self, value: &BigInt) -> BigUint {
        self.ring_n.normalize_signed(value)
    }

    fn check_plaintext(&self, m: &BigUint) -> Result<(), CryptoError> {
        if !self.ring_n.contains(m) {
            return Err(CryptoError::RangeError(format!(
                "plaintext must be smaller than N ({} bits)",
                self.n().bits()
            )));
        }

        Ok(())
    }

    fn check_ciphertext<'a>(&self, c: &'a Ciphertext) -> Result<&'a BigUint, CryptoError> {
        let value = c.value();
        if value.is_zero() || !self.ring_n2.contains(value) {
            return Err(CryptoError::CorruptCiphertext(
                "ciphertext must lie in (0, N²)".to_string(),
            ));
        }

        Ok(value)
    }
}
