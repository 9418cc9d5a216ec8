//! # Key material
//!
//! One keypair, two capabilities. [`Verifier`] carries `N` and can encrypt,
//! combine and finish decryptions. [`Decryptor`] carries the factorization and
//! answers decryption hints. They never share a type, so the secret can never
//! travel through the verifier's channel.

pub mod decryptor;
pub mod helper;
pub mod verifier;

pub use decryptor::Decryptor;
pub use verifier::Verifier;

use crate::errors::CryptoError;

use num_bigint::BigUint;

/// Derives both views of the keypair `N = p·q` for `owner_id`.
pub fn split(
    owner_id: impl Into<String>,
    p: BigUint,
    q: BigUint,
) -> Result<(Verifier, Decryptor), CryptoError> {
    let decryptor = Decryptor::try_with(owner_id, p, q)?;
    let verifier = decryptor.verifier()?;

    Ok((verifier, decryptor))
}
