//! # SecureDrive Crypto
//!
//! An additively homomorphic cryptosystem of the Paillier family with the
//! decryption split between two roles:
//!
//! * the [`keypair::Verifier`] (public `N`) encrypts, adds, subtracts and scales
//!   ciphertexts, derives the hint `R = C mod N` and completes decryption;
//! * the [`keypair::Decryptor`] (secret `λ`) turns `R` into `R'`.
//!
//! The verifier checks `R'^N ≡ C (mod N)` before any plaintext is derived.

pub mod cipher;
pub mod codec;
pub mod errors;
pub mod gen_r;
pub mod keypair;
pub mod preset;
pub mod ring;

pub use cipher::{Ciphertext, DecryptionHint, DecryptionShare};
pub use errors::CryptoError;
pub use gen_r::RandomnessContext;
pub use keypair::{Decryptor, Verifier};
