#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    /// Plaintext outside `[0, N)`.
    #[error("RangeError: {0}")]
    RangeError(String),
    /// Encryption randomness outside `[1, N-1]` or not a unit mod N.
    #[error("InvalidRandomness: {0}")]
    InvalidRandomness(String),
    /// Error when trying to find a modular inverse that doesn't exist (gcd(a, k) != 1).
    #[error("NoInverse: {0}")]
    NoInverse(String),
    /// A ciphertext is not a unit of Z_{N²}, or the decryption did not divide exactly.
    #[error("CorruptCiphertext: {0}")]
    CorruptCiphertext(String),
    #[error("VerificationFailed: decryption share does not match the ciphertext")]
    VerificationFailed,
    /// N is not invertible mod λ. Only a broken key can produce this.
    #[error("NoModularInverse: {0}")]
    NoModularInverse(String),
    #[error("EmptyInput: {0}")]
    EmptyInput(String),
    /// Error when creating a ring with an invalid modulus (k <= 1).
    #[error("InvalidModulus: {0}")]
    InvalidModulus(String),

    #[error("InvalidParameters: {0}")]
    InvalidParameters(String),
    #[error("ParseError: {0}")]
    ParseError(String),

    #[error("Data serialization: {0}")]
    SerializationError(#[from] serde_json::Error),
}
