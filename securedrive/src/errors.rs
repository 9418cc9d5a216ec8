use securedrive_crypto::errors::CryptoError;

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    /// A referenced record is absent from the store.
    #[error("NotFound: {0}")]
    NotFound(String),
    #[error("AlreadyExists: {0}")]
    AlreadyExists(String),
    /// The calculation result has already been decrypted and accounted.
    #[error("AlreadyResolved: {0}")]
    AlreadyResolved(String),
    /// A compare-and-swap lost against a concurrent writer.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("InvalidArguments: {0}")]
    InvalidArguments(String),
    #[error("InvalidDate: {0}")]
    InvalidDate(String),
    /// Plaintext outside `[0, N / k)` for the configured safety margin `k`.
    #[error("PlaintextOutOfBounds: {0}")]
    PlaintextOutOfBounds(String),
    #[error("UnknownFunction: {0}")]
    UnknownFunction(String),

    #[error("Store: {0}")]
    Store(String),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("Data serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}
