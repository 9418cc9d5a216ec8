use crate::errors::CryptoError;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

/// Carmichael function of `N = p·q`: `λ = lcm(p - 1, q - 1)`.
///
/// # Arguments
/// * `p`, `q` - The two (odd, distinct) prime factors of the modulus
///
/// # Returns
/// `λ`, or `InvalidParameters` when a factor is smaller than 3
pub fn carmichael_lambda(p: &BigUint, q: &BigUint) -> Result<BigUint, CryptoError> {
    let three = BigUint::from(3u32);
    if p < &three || q < &three {
        return Err(CryptoError::InvalidParameters(
            "Prime factors must be at least 3".to_string(),
        ));
    }

    Ok((p - 1u32).lcm(&(q - 1u32)))
}

/// Checks that a public modulus is usable: odd and at least 3.
///
/// # Arguments
/// * `n` - The candidate modulus
pub fn validate_modulus(n: &BigUint) -> Result<(), CryptoError> {
    if n < &BigUint::from(3u32) {
        return Err(CryptoError::InvalidModulus(format!(
            "N must be at least 3, got {}",
            n
        )));
    }
    if n.is_even() {
        return Err(CryptoError::InvalidModulus(format!("N must be odd, got {}", n)));
    }

    Ok(())
}

/// `N⁻¹ mod λ`, the exponent the decryptor raises `R` to.
pub fn inverse_modulus(n: &BigUint, lambda: &BigUint) -> Result<BigUint, CryptoError> {
    if lambda.is_zero() || !n.gcd(lambda).is_one() {
        return Err(CryptoError::NoModularInverse(
            "N and λ are not coprime".to_string(),
        ));
    }

    (n % lambda).modinv(lambda).ok_or_else(|| {
        CryptoError::NoModularInverse("N has no inverse modulo λ".to_string())
    })
}
