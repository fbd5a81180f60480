//! Benchmark: guard chain evaluation
//!
//! # Background
//!
//! Every guarded operation goes through `DecisionEngine::decide`, and
//! chains call it once per consulted member. This measures:
//!
//! - a cold decision (fresh call, every member runs)
//! - a warm decision (same call, chain result served from the function cache)
//! - chain length scaling with members that all refer
//!
//! # When to revisit
//!
//! - If guards gain per-check allocation
//! - If the function cache moves away from a plain `HashMap`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rpcc_auth::guards::{AuthRequired, IdentityListGuard};
use rpcc_auth::{CallContext, Chain, DecisionEngine, GuardRef};
use rpcc_types::Principal;
use std::sync::Arc;

fn referring_members(engine: &DecisionEngine, n: usize) -> Vec<GuardRef> {
    (0..n)
        .map(|i| engine.register(IdentityListGuard::new(format!("list-{i}"), ["nobody"])))
        .collect()
}

fn bench_chain_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_eval");

    let engine = Arc::new(DecisionEngine::new());
    let auth = engine.register(AuthRequired);
    let chain = engine.register(Chain::any_grants(
        "auth-or-superuser",
        [engine.superuser(), auth],
    ));

    group.bench_function("cold", |b| {
        b.iter(|| {
            let call =
                CallContext::new(Arc::clone(&engine), 0).with_principal(Principal::user("alice"));
            black_box(engine.decide(&chain, &call, &call))
        });
    });

    let warm = CallContext::new(Arc::clone(&engine), 0).with_principal(Principal::user("alice"));
    engine.decide(&chain, &warm, &warm);
    group.bench_function("warm", |b| {
        b.iter(|| black_box(engine.decide(&chain, &warm, &warm)));
    });

    // === Scaling with chain length ===

    for n in [1usize, 8, 32] {
        let members = referring_members(&engine, n);
        let long = engine.register(Chain::first_opinion(format!("long-{n}"), members));
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("first_opinion_all_referred", n), &n, |b, _| {
            b.iter(|| {
                let call = CallContext::new(Arc::clone(&engine), 0)
                    .with_principal(Principal::user("alice"));
                black_box(engine.decide(&long, &call, &call))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_chain_eval);
criterion_main!(benches);
