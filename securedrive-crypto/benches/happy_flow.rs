use criterion::{Criterion, black_box, criterion_group, criterion_main};
use num_bigint::BigUint;
use securedrive_crypto::preset::demo_keys::demo_keypair;

fn bench_happy_flow(c: &mut Criterion) {
    // 1) one-time setup
    let (verifier, decryptor) = demo_keypair("bench").expect("build demo keys");
    let message = BigUint::from(52_517u32);
    let cipher = verifier.encrypt(&message).expect("encrypt");

    c.bench_function("encrypt", |b| {
        b.iter(|| verifier.encrypt(black_box(&message)).expect("encrypt"))
    });

    c.bench_function("homomorphic_multiplication", |b| {
        let alpha = BigUint::from(1_000u32);
        b.iter(|| {
            verifier
                .homomorphic_multiplication(black_box(&cipher), black_box(&alpha))
                .expect("scale")
        })
    });

    c.bench_function("two_party_decrypt", |b| {
        b.iter(|| {
            // 2) verifier derives R, decryptor answers with R'
            let hint = verifier.compute_r(black_box(&cipher)).expect("compute R");
            let share = decryptor.compute_r_prime(&hint).expect("compute R'");

            // 3) verify and recover
            let plain = verifier.verify_and_decrypt(&cipher, &share).expect("decrypt");
            black_box(plain)
        })
    });
}

criterion_group!(benches, bench_happy_flow);
criterion_main!(benches);
