use securedrive_crypto::errors::CryptoError;
use securedrive_crypto::keypair::{Decryptor, Verifier};
use securedrive_crypto::preset::demo_keys::demo_keypair;
use securedrive_crypto::Ciphertext;

use lazy_static::lazy_static;
use num_bigint::{BigInt, BigUint};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

lazy_static! {
    static ref KEYS: (Verifier, Decryptor) =
        demo_keypair("property").expect("demo keys are valid");
}

fn decrypt(c: &Ciphertext) -> Result<BigUint, CryptoError> {
    let (verifier, decryptor) = &*KEYS;
    let share = decryptor.compute_r_prime(&verifier.compute_r(c)?)?;
    verifier.verify_and_decrypt(c, &share)
}

fn check(outcome: Result<bool, CryptoError>) -> TestResult {
    match outcome {
        Ok(holds) => TestResult::from_bool(holds),
        Err(e) => TestResult::error(e.to_string()),
    }
}

#[quickcheck]
fn prop_round_trip(m: u64) -> TestResult {
    check((|| -> Result<bool, CryptoError> {
        let m = BigUint::from(m);
        let c = KEYS.0.encrypt(&m)?;
        Ok(decrypt(&c)? == m)
    })())
}

#[quickcheck]
fn prop_addition(a: u64, b: u64) -> TestResult {
    check((|| -> Result<bool, CryptoError> {
        let verifier = &KEYS.0;
        let sum = verifier.homomorphic_addition(
            &verifier.encrypt(&BigUint::from(a))?,
            &verifier.encrypt(&BigUint::from(b))?,
        )?;
        Ok(decrypt(&sum)? == BigUint::from(a) + BigUint::from(b))
    })())
}

#[quickcheck]
fn prop_scalar_multiplication(m: u32, alpha: u32) -> TestResult {
    check((|| -> Result<bool, CryptoError> {
        let verifier = &KEYS.0;
        let scaled = verifier.homomorphic_multiplication(
            &verifier.encrypt(&BigUint::from(m))?,
            &BigUint::from(alpha),
        )?;
        Ok(decrypt(&scaled)? == BigUint::from(m) * BigUint::from(alpha))
    })())
}

#[quickcheck]
fn prop_subtraction_is_signed(a: u32, b: u32) -> TestResult {
    check((|| -> Result<bool, CryptoError> {
        let verifier = &KEYS.0;
        let diff = verifier.homomorphic_subtraction(
            &verifier.encrypt(&BigUint::from(a))?,
            &verifier.encrypt(&BigUint::from(b))?,
        )?;
        let expected = BigInt::from(a) - BigInt::from(b);
        Ok(verifier.decode_signed(&decrypt(&diff)?) == expected)
    })())
}

#[quickcheck]
fn prop_sum_matches_plain_sum(values: Vec<u32>) -> TestResult {
    if values.is_empty() {
        return TestResult::discard();
    }

    check((|| -> Result<bool, CryptoError> {
        let verifier = &KEYS.0;
        let ciphertexts = values
            .iter()
            .map(|v| verifier.encrypt(&BigUint::from(*v)))
            .collect::<Result<Vec<_>, _>>()?;
        let expected: BigUint = values.iter().map(|v| BigUint::from(*v)).sum();
        Ok(decrypt(&verifier.homomorphic_sum(&ciphertexts)?)? == expected)
    })())
}

#[quickcheck]
fn prop_subtraction_undoes_addition(m: u64, d: u64) -> TestResult {
    check((|| -> Result<bool, CryptoError> {
        let verifier = &KEYS.0;
        let c = verifier.encrypt(&BigUint::from(m))?;
        let d = verifier.encrypt(&BigUint::from(d))?;

        let restored = verifier.homomorphic_subtraction(&verifier.homomorphic_addition(&c, &d)?, &d)?;
        Ok(decrypt(&restored)? == BigUint::from(m))
    })())
}

#[test]
fn operations_wrap_around_n() -> Result<(), CryptoError> {
    let verifier = &KEYS.0;
    let n = verifier.n();
    let minus_one = verifier.encode_signed(&BigInt::from(-1));
    assert_eq!(&minus_one, &(n - 1u32));

    let c = verifier.encrypt(&minus_one)?;
    let sum = verifier.homomorphic_addition(&c, &verifier.encrypt(&BigUint::from(5u32))?)?;
    assert_eq!(decrypt(&sum)?, BigUint::from(4u32));

    let tripled = verifier.homomorphic_multiplication(&c, &BigUint::from(3u32))?;
    assert_eq!(decrypt(&tripled)?, n - 3u32);
    assert_eq!(verifier.decode_signed(&decrypt(&tripled)?), BigInt::from(-3));

    Ok(())
}
