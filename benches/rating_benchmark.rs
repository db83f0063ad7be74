use criterion::{criterion_group, criterion_main, Criterion};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::hint::black_box;
use studio_booking::models::{RatingDelta, TrainerRating};
use studio_booking::routes::webhook::verify_signature;

fn benchmark_rating_updates(c: &mut Criterion) {
    // A realistic review history: mostly additions, some edits and removals
    let deltas: Vec<RatingDelta> = (0..1000u32)
        .map(|i| {
            let rating = (i % 5 + 1) as u8;
            match i % 10 {
                7 => RatingDelta::Changed {
                    from: rating,
                    to: 6 - rating,
                },
                9 => RatingDelta::Removed(rating),
                _ => RatingDelta::Added(rating),
            }
        })
        .collect();

    c.bench_function("apply_1000_rating_deltas", |b| {
        b.iter(|| {
            let mut aggregate = TrainerRating::default();
            for delta in &deltas {
                aggregate.apply(black_box(*delta));
            }
            aggregate
        })
    });
}

fn benchmark_webhook_signature(c: &mut Criterion) {
    let secret = "whsec_bench";
    let timestamp = 1_700_000_000;
    let payload = serde_json::json!({
        "id": "evt_bench",
        "type": "checkout.session.completed",
        "data": { "object": { "id": "cs_bench", "amount_total": 2000 } }
    })
    .to_string();

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    let header = format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    );

    let mut group = c.benchmark_group("webhook_signature");

    group.bench_function("valid", |b| {
        b.iter(|| {
            verify_signature(
                black_box(&header),
                black_box(payload.as_bytes()),
                secret,
                timestamp,
            )
        })
    });

    group.bench_function("mismatch", |b| {
        b.iter(|| {
            verify_signature(
                black_box(&header),
                black_box(b"{}".as_slice()),
                secret,
                timestamp,
            )
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_rating_updates, benchmark_webhook_signature);
criterion_main!(benches);
