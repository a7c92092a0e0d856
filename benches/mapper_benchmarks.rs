use alloy::primitives::U256;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use transaction_proof_relayer::app::{map_to_proof_request, quantity_hex};
use transaction_proof_relayer::domain::ProofQuery;
use transaction_proof_relayer::test_utils::sample_transaction;
use validator::Validate;

fn bench_mapping(c: &mut Criterion) {
    let dynamic = sample_transaction("0xabc");
    let mut legacy = sample_transaction("0xdef");
    legacy.tx_type = 0;

    c.bench_function("map_dynamic_fee_transaction", |b| {
        b.iter(|| map_to_proof_request(black_box(&dynamic)))
    });
    c.bench_function("map_legacy_transaction", |b| {
        b.iter(|| map_to_proof_request(black_box(&legacy)))
    });
    c.bench_function("quantity_hex", |b| {
        b.iter(|| quantity_hex(black_box(U256::from(1_000_000_000_000_000_000u64))))
    });
}

fn bench_validation(c: &mut Criterion) {
    let query = ProofQuery {
        address: Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string()),
    };

    c.bench_function("validate_proof_query", |b| {
        b.iter(|| {
            let _ = black_box(&query).validate();
        })
    });
}

criterion_group!(benches, bench_mapping, bench_validation);
criterion_main!(benches);
