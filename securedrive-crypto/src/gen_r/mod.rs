//! # Encryption randomness
//!
//! Two sources for the `r` of `C = (1 + m·N) · r^N mod N²`:
//!
//! * [`fresh_r`] draws a uniform unit from the thread RNG. This is the default.
//! * [`derive_r`] hashes a [`RandomnessContext`] with SHA-256, so the same context
//!   always gives the same ciphertext. Equal contexts produce equal ciphertexts,
//!   which an observer can link; use it only when reproducibility is required.

use crate::errors::CryptoError;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use rand::RngCore;
use sha2::{Digest, Sha256};

const MAX_SAMPLING_ATTEMPTS: usize = 1000;

/// Ordered identifiers a deterministic `r` is derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RandomnessContext {
    parts: Vec<String>,
}

impl RandomnessContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, part: impl Into<String>) -> Self {
        self.parts.push(part.into());
        self
    }

    /// Context for one field of a record. Each field gets its own `r`: two
    /// ciphertexts sharing `r` would leak the difference of their plaintexts.
    pub fn for_field(&self, label: &str) -> Self {
        self.clone().with(label)
    }

    pub fn encode(&self) -> String {
        self.parts.join("|")
    }
}

/// `r = (SHA-256(context) mod (n - 1)) + 1`, always in `[1, n-1]`.
///
/// # Example
///
/// ```
/// # use num_bigint::BigUint;
/// # use securedrive_crypto::gen_r::{derive_r, RandomnessContext};
/// let n = BigUint::from(1_000_003u32 * 7u32);
/// let ctx = RandomnessContext::new().with("veh1").with("trip1");
/// let r = derive_r(&ctx, &n).unwrap();
/// assert_eq!(r, derive_r(&ctx, &n).unwrap());
/// assert!(r >= BigUint::from(1u32) && r < n);
/// ```
pub fn derive_r(context: &RandomnessContext, n: &BigUint) -> Result<BigUint, CryptoError> {
    let bound = span(n)?;

    let digest = Sha256::digest(context.encode().as_bytes());
    let hashed = BigUint::from_bytes_be(&digest);

    Ok(hashed % bound + 1u32)
}

/// Uniform `r ∈ [1, n-1]` with `gcd(r, n) = 1`, from the thread RNG.
pub fn fresh_r(n: &BigUint) -> Result<BigUint, CryptoError> {
    fresh_r_with(n, &mut rand::rng())
}

/// Same as [`fresh_r`] with a caller-provided generator.
pub fn fresh_r_with<R: RngCore + ?Sized>(n: &BigUint, rng: &mut R) -> Result<BigUint, CryptoError> {
    let bound = span(n)?;
    // 64 extra bits make the modulo bias negligible
    let byte_len = (bound.bits() as usize).div_ceil(8) + 8;
    let mut buffer = vec![0u8; byte_len];

    for _ in 0..MAX_SAMPLING_ATTEMPTS {
        rng.fill_bytes(&mut buffer);
        let r = BigUint::from_bytes_be(&buffer) % &bound + 1u32;
        if r.gcd(n).is_one() {
            return Ok(r);
        }
    }

    Err(CryptoError::InvalidParameters(format!(
        "could not sample a unit mod n after {} tries",
        MAX_SAMPLING_ATTEMPTS
    )))
}

/// `n - 1`, the size of `[1, n-1]`.
fn span(n: &BigUint) -> Result<BigUint, CryptoError> {
    if n < &BigUint::from(3u32) {
        return Err(CryptoError::InvalidModulus(format!(
            "Modulus must be at least 3 to draw randomness, got {}",
            n
        )));
    }

    Ok(n - 1u32)
}
