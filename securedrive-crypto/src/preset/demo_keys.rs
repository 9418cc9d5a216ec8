use crate::errors::CryptoError;
use crate::keypair::{Decryptor, Verifier, split};

use lazy_static::lazy_static;
use num_bigint::BigUint;

lazy_static! {
    /// 2^89 - 1, a Mersenne prime.
    pub static ref DEMO_P: BigUint = (BigUint::from(1u32) << 89u32) - 1u32;

    /// 2^107 - 1, a Mersenne prime. `gcd(p·q, λ) = 1` because neither prime
    /// divides the other minus one.
    pub static ref DEMO_Q: BigUint = (BigUint::from(1u32) << 107u32) - 1u32;
}

/// A fixed, publicly known keypair for tests, benchmarks and local demos.
///
/// Its factors are printed above: it protects nothing.
pub fn demo_keypair(owner_id: &str) -> Result<(Verifier, Decryptor), CryptoError> {
    split(owner_id, DEMO_P.clone(), DEMO_Q.clone())
}
