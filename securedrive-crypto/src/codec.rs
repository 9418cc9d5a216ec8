//! Decimal-string codec for big integers.
//!
//! Records keep every big integer as a base-10 string so that no JSON consumer
//! ever rounds it through a float.

use crate::errors::CryptoError;

use num_bigint::BigUint;

/// Parses a non-negative base-10 integer. Signs, whitespace and digit separators
/// are rejected.
///
/// # Example
///
/// ```
/// # use num_bigint::BigUint;
/// # use securedrive_crypto::codec::parse_decimal;
/// assert_eq!(parse_decimal("50000").unwrap(), BigUint::from(50000u32));
/// assert!(parse_decimal("-1").is_err());
/// assert!(parse_decimal("1_000").is_err());
/// assert!(parse_decimal("").is_err());
/// ```
pub fn parse_decimal(value: &str) -> Result<BigUint, CryptoError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CryptoError::ParseError(format!(
            "'{}' is not a non-negative decimal integer",
            value
        )));
    }

    BigUint::parse_bytes(value.as_bytes(), 10)
        .ok_or_else(|| CryptoError::ParseError(format!("'{}' is not a decimal integer", value)))
}

pub fn to_decimal(value: &BigUint) -> String {
    value.to_str_radix(10)
}

/// `#[serde(with = "codec::decimal")]` adapter for `BigUint` fields.
pub mod decimal {
    use super::{parse_decimal, to_decimal};

    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&to_decimal(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_decimal(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "decimal")]
        value: BigUint,
    }

    #[test]
    fn test_large_values_survive_json() -> Result<(), CryptoError> {
        let value = parse_decimal("4951760157141521099596496895")?;
        let json = serde_json::to_string(&Holder {
            value: value.clone(),
        })?;
        assert_eq!(json, r#"{"value":"4951760157141521099596496895"}"#);

        let back: Holder = serde_json::from_str(&json)?;
        assert_eq!(back.value, value);
        Ok(())
    }

    #[test]
    fn test_rejects_non_decimal() {
        assert!(parse_decimal("12a").is_err());
        assert!(parse_decimal(" 12").is_err());
        assert!(serde_json::from_str::<Holder>(r#"{"value":"0x10"}"#).is_err());
        assert!(serde_json::from_str::<Holder>(r#"{"value":16}"#).is_err());
    }
}
