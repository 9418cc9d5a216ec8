//! Implementation of ring ops using arbitrary-precision modular arithmetic.

use crate::errors::CryptoError;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};

/// Represents a finite ring Z_k over `BigUint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRing {
    modulus: BigUint,
}

impl ModRing {
    /// Create a new ring with the given modulus.
    ///
    /// The modulus must be greater than 1.
    pub fn try_with(modulus: BigUint) -> Result<Self, CryptoError> {
        if modulus <= BigUint::one() {
            return Err(CryptoError::InvalidModulus(format!(
                "Modulus must be greater than 1, got {}",
                modulus
            )));
        }

        Ok(ModRing { modulus })
    }

    /// Returns the modulus of the ring.
    ///
    /// # Example
    ///
    /// ```
    /// # use num_bigint::BigUint;
    /// # use securedrive_crypto::ring::ModRing;
    /// let ring = ModRing::try_with(BigUint::from(13u32)).unwrap();
    /// assert_eq!(ring.modulus(), &BigUint::from(13u32));
    /// ```
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Whether `value` is already a canonical residue, i.e. `value < modulus`.
    pub fn contains(&self, value: &BigUint) -> bool {
        value < &self.modulus
    }

    /// Reduces a value into `[0, modulus - 1]`.
    ///
    /// # Example
    ///
    /// ```
    /// # use num_bigint::BigUint;
    /// # use securedrive_crypto::ring::ModRing;
    /// let ring = ModRing::try_with(BigUint::from(10u32)).unwrap();
    /// assert_eq!(ring.normalize(&BigUint::from(15u32)), BigUint::from(5u32));
    /// assert_eq!(ring.normalize(&BigUint::from(10u32)), BigUint::from(0u32));
    /// ```
    pub fn normalize(&self, value: &BigUint) -> BigUint {
        value % &self.modulus
    }

    /// Reduces a signed value into `[0, modulus - 1]`, wrapping negatives around.
    ///
    /// # Example
    ///
    /// ```
    /// # use num_bigint::{BigInt, BigUint};
    /// # use securedrive_crypto::ring::ModRing;
    /// let ring = ModRing::try_with(BigUint::from(10u32)).unwrap();
    /// assert_eq!(ring.normalize_signed(&BigInt::from(-3)), BigUint::from(7u32));
    /// ```
    pub fn normalize_signed(&self, value: &BigInt) -> BigUint {
        let modulus = BigInt::from_biguint(Sign::Plus, self.modulus.clone());
        // mod_floor with a positive modulus is never negative
        value
            .mod_floor(&modulus)
            .to_biguint()
            .unwrap_or_else(BigUint::zero)
    }

    /// Computes `(a * b) mod modulus`.
    ///
    /// # Example
    ///
    /// ```
    /// # use num_bigint::BigUint;
    /// # use securedrive_crypto::ring::ModRing;
    /// let ring = ModRing::try_with(BigUint::from(10u32)).unwrap();
    /// assert_eq!(ring.mul(&BigUint::from(7u32), &BigUint::from(5u32)), BigUint::from(5u32));
    /// ```
    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.modulus
    }

    /// Computes `base^exponent mod modulus`.
    pub fn pow(&self, base: &BigUint, exponent: &BigUint) -> BigUint {
        base.modpow(exponent, &self.modulus)
    }

    /// Whether `a` is a unit of the ring, i.e. `gcd(a, modulus) == 1`.
    pub fn is_unit(&self, a: &BigUint) -> bool {
        self.normalize(a).gcd(&self.modulus).is_one()
    }

    /// Computes the modular multiplicative inverse `a^-1 mod modulus`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NoInverse` if `a` is 0 or `gcd(a, modulus) != 1`.
    ///
    /// # Example
    ///
    /// ```
    /// # use num_bigint::BigUint;
    /// # use securedrive_crypto::ring::ModRing;
    /// let ring = ModRing::try_with(BigUint::from(10u32)).unwrap();
    /// assert_eq!(ring.inv(&BigUint::from(3u32)).unwrap(), BigUint::from(7u32));
    /// assert!(ring.inv(&BigUint::from(2u32)).is_err());
    /// assert!(ring.inv(&BigUint::from(0u32)).is_err());
    /// ```
    pub fn inv(&self, a: &BigUint) -> Result<BigUint, CryptoError> {
        let a_norm = self.normalize(a);
        if a_norm.is_zero() {
            return Err(CryptoError::NoInverse(format!(
                "Cannot invert 0 in mod {}",
                self.modulus
            )));
        }

        a_norm.modinv(&self.modulus).ok_or_else(|| {
            CryptoError::NoInverse(format!(
                "Modular inverse does not exist (gcd={})",
                a_norm.gcd(&self.modulus)
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(modulus: u32) -> Result<ModRing, CryptoError> {
        ModRing::try_with(BigUint::from(modulus))
    }

    fn big(value: u32) -> BigUint {
        BigUint::from(value)
    }

    #[test]
    fn test_ring_creation() {
        assert!(ring(11).is_ok());
        assert!(ring(25).is_ok());
        assert!(ring(1).is_err());
        assert!(ring(0).is_err());
    }

    #[test]
    fn test_normalization() -> Result<(), CryptoError> {
        let ring = ring(11)?;
        assert_eq!(ring.normalize(&big(5)), big(5));
        assert_eq!(ring.normalize(&big(16)), big(5));
        assert_eq!(ring.normalize_signed(&BigInt::from(-6)), big(5));
        assert_eq!(ring.normalize_signed(&BigInt::from(-22)), big(0));
        Ok(())
    }

    #[test]
    fn test_multiplication_and_power() -> Result<(), CryptoError> {
        let ring = ring(11)?;
        assert_eq!(ring.mul(&big(5), &big(8)), big(7));
        assert_eq!(ring.pow(&big(2), &big(10)), big(1));
        assert_eq!(ring.pow(&big(3), &big(0)), big(1));
        Ok(())
    }

    #[test]
    fn test_inversion() -> Result<(), CryptoError> {
        let ring = ring(11)?;
        assert_eq!(ring.inv(&big(5))?, big(9));

        let composite = self::ring(25)?;
        assert!(matches!(composite.inv(&big(10)), Err(CryptoError::NoInverse(_))));
        assert!(!composite.is_unit(&big(15)));
        assert!(composite.is_unit(&big(7)));
        Ok(())
    }
}
