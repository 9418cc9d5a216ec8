use criterion::{Criterion, black_box, criterion_group, criterion_main};
use fake::Fake;
use num_bigint::BigUint;
use securedrive::records::{CriteriaWeights, TripMetrics, VehicleData};
use securedrive::{Ledger, MemoryStore, Settings};
use securedrive_crypto::keypair::helper::carmichael_lambda;
use securedrive_crypto::preset::demo_keys::{DEMO_P, DEMO_Q};

const OWNER: &str = "bench";

fn bench_premium_flow(c: &mut Criterion) {
    // 1) keys, policy and one vehicle
    let ledger = Ledger::new(MemoryStore::new(), Settings::default()).expect("ledger");
    let n: BigUint = &*DEMO_P * &*DEMO_Q;
    let lambda = carmichael_lambda(&DEMO_P, &DEMO_Q).expect("lambda");
    ledger.add_verifier(OWNER, n.clone(), &n * &n).expect("verifier");
    ledger
        .add_decryptor(OWNER, DEMO_P.clone(), DEMO_Q.clone(), n, lambda)
        .expect("decryptor");
    ledger
        .add_criteria_weights(CriteriaWeights {
            weights_id: "w1".to_string(),
            weight_traffic: 3,
            weight_speed: 2,
            weight_acceleration: 1,
            weight_braking: 1,
            weight_distance: 1,
            weight_zone: 1,
            weight_time: 1,
            alpha: 5,
            beta: 2,
        })
        .expect("weights");

    let vehicle = VehicleData {
        vehicle_type: 1,
        purchase_mileage: 50_000,
        year: 2020,
    };
    let metrics = TripMetrics {
        speeding: 3,
        hard_accelerations: 1,
        unsafe_distance: 2,
        traffic_signal_compliance: 4,
        night_driving: 1,
        mileage: 100,
        ..TripMetrics::default()
    };
    ledger.add_vehicle("veh1", &vehicle, OWNER).expect("vehicle");
    ledger
        .add_trip("veh1", "trip1", "2024-11-05", &metrics, OWNER)
        .expect("trip");

    c.bench_function("add_trip", |b| {
        b.iter(|| {
            let trip_id: String = (8..16).fake();
            ledger
                .add_trip("veh1", black_box(&trip_id), "2024-11-05", &metrics, OWNER)
                .expect("trip")
        })
    });

    c.bench_function("calculate_premium", |b| {
        b.iter(|| {
            ledger
                .calculate_premium("veh1", black_box("trip1"), "w1")
                .expect("calculate")
        })
    });

    // 2) both decryption roles, without settling
    c.bench_function("reveal_premium", |b| {
        b.iter(|| ledger.reveal_premium(black_box("result_trip1")).expect("reveal"))
    });
}

criterion_group!(benches, bench_premium_flow);
criterion_main!(benches);
