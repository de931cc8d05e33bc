//! # Consensus and Block Verification Benchmarks
//!
//! | Area | Hot path | Scales with |
//! |------|----------|-------------|
//! | qc-08 Determiner | `determine_consensus` per pending timestamp | participants |
//! | qc-08 Evaluator | one tick over many pending timestamps | pending entries |
//! | shared-crypto BlockVerifier | `compute_block_hash` on every fetched block | transactions |
//! | qc-13 Height quorum | `quorum_height` per discovery round | peers |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_08_consensus::{
    determine_consensus, ConsensusCheckResult, ConsensusDeterminer, EvaluationJob,
    ParallelConsensusEvaluator,
};
use qc_13_catchup::quorum_height;
use serde_json::json;
use shared_crypto::{compute_block_hash, sha3_256};
use shared_types::{
    HeightClaim, HlcTimestamp, NodeId, StateDelta, SubBlock, TxResult, GENESIS_HASH,
};
use std::collections::BTreeMap;
use std::time::Duration;

fn node(i: usize) -> NodeId {
    NodeId(sha3_256(&i.to_be_bytes()))
}

/// `n` votes, split between two results roughly 2:1.
fn votes(n: usize) -> BTreeMap<NodeId, [u8; 32]> {
    (0..n)
        .map(|i| (node(i), if i % 3 == 2 { [2u8; 32] } else { [1u8; 32] }))
        .collect()
}

// ============================================================================
// QC-08: Consensus determination
// ============================================================================

fn bench_determine_consensus(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-08-determiner");

    for participants in [3usize, 16, 64, 256] {
        let solutions = votes(participants);
        group.throughput(Throughput::Elements(participants as u64));
        group.bench_with_input(
            BenchmarkId::new("determine_consensus", participants),
            &solutions,
            |b, solutions| {
                b.iter(|| {
                    black_box(determine_consensus(
                        solutions,
                        participants,
                        &ConsensusCheckResult::initial(),
                        51,
                    ))
                })
            },
        );
    }

    group.finish();
}

fn bench_parallel_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-08-evaluator");
    group.measurement_time(Duration::from_secs(10));

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(_) => return,
    };
    let evaluator = match ParallelConsensusEvaluator::new(
        num_workers(),
        ConsensusDeterminer::new(51),
        Duration::from_millis(250),
    ) {
        Ok(evaluator) => evaluator,
        Err(_) => return,
    };

    for pending in [10usize, 100, 500] {
        let jobs: Vec<EvaluationJob> = (0..pending)
            .map(|i| EvaluationJob {
                hlc: HlcTimestamp::new(i as u64, 0),
                solutions: votes(16),
                last_check_info: ConsensusCheckResult::initial(),
            })
            .collect();

        group.throughput(Throughput::Elements(pending as u64));
        group.bench_with_input(BenchmarkId::new("tick", pending), &jobs, |b, jobs| {
            b.iter(|| black_box(runtime.block_on(evaluator.evaluate(jobs.clone(), 16))))
        });
    }

    group.finish();
}

fn num_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}

// ============================================================================
// shared-crypto: Block hashing
// ============================================================================

fn subblock(tx_count: usize) -> SubBlock {
    SubBlock {
        input_hash: [7u8; 32],
        transactions: (0..tx_count)
            .map(|i| TxResult {
                tx_hash: sha3_256(&i.to_be_bytes()),
                status: 0,
                payload: json!({"sender": "alice", "nonce": i, "kwargs": {"to": "bob", "amount": i}}),
                state: vec![StateDelta {
                    key: format!("currency.balances:{i}"),
                    value: json!(i),
                }],
            })
            .collect(),
        merkle_root: [8u8; 32],
        signatures: vec![],
    }
}

fn bench_block_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-crypto-block-hash");

    for tx_count in [1usize, 10, 100] {
        let subblocks = vec![subblock(tx_count)];
        group.throughput(Throughput::Elements(tx_count as u64));
        group.bench_with_input(
            BenchmarkId::new("compute_block_hash", tx_count),
            &subblocks,
            |b, subblocks| b.iter(|| black_box(compute_block_hash(&GENESIS_HASH, subblocks))),
        );
    }

    group.finish();
}

// ============================================================================
// QC-13: Height quorum
// ============================================================================

fn bench_height_quorum(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-13-height-quorum");

    for peers in [4usize, 32, 128] {
        let claims: BTreeMap<NodeId, HeightClaim> = (0..peers)
            .map(|i| {
                let height = if i % 4 == 0 { 101 } else { 90 };
                (node(i), HeightClaim { height, hash: [0u8; 32] })
            })
            .collect();
        let threshold = 3.min(peers - 1).max(1);

        group.bench_with_input(BenchmarkId::new("quorum_height", peers), &claims, |b, claims| {
            b.iter(|| black_box(quorum_height(claims, None, threshold)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_determine_consensus,
    bench_parallel_evaluation,
    bench_block_hash,
    bench_height_quorum
);
criterion_main!(benches);
