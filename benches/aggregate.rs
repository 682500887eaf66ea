// Aggregated balance proof benchmarks
//
// Run with: cargo bench --bench aggregate

extern crate balance_proofs;
use balance_proofs::{AggregateProof, BulletproofGens, PedersenGens, Role};

#[macro_use]
extern crate criterion;
use criterion::Criterion;

extern crate curve25519_dalek;
use curve25519_dalek::scalar::Scalar;

extern crate merlin;
use merlin::Transcript;

extern crate rand;
use rand::Rng;

/// Balanced amounts for `m` parties: half sources, half destinations,
/// where destination `j` spends exactly what source `j` received.
fn balanced_amounts(n: usize, m: usize) -> (Vec<u64>, Vec<Role>) {
    let mut rng = rand::thread_rng();
    let max = if n == 64 { u64::max_value() } else { (1u64 << n) - 1 };

    let mut values = Vec::with_capacity(m);
    let mut roles = Vec::with_capacity(m);
    for _ in 0..m / 2 {
        let v = rng.gen_range(0, max);
        values.push(v);
        roles.push(Role::Source);
        values.push(v);
        roles.push(Role::Destination);
    }
    (values, roles)
}

fn create_aggregated_balance_proof_helper(n: usize, c: &mut Criterion) {
    let label = format!("Aggregated {}-bit balance proof creation", n);

    c.bench_function_over_inputs(
        &label,
        move |b, &&m| {
            let pc_gens = PedersenGens::default();
            let bp_gens = BulletproofGens::new(n, m);
            let mut rng = rand::thread_rng();

            let (values, roles) = balanced_amounts(n, m);
            let blindings: Vec<Scalar> = (0..m).map(|_| Scalar::random(&mut rng)).collect();

            b.iter(|| {
                let mut transcript = Transcript::new(b"AggregateBalanceProofBenchmark");
                AggregateProof::prove(
                    &bp_gens,
                    &pc_gens,
                    &mut transcript,
                    &values,
                    &blindings,
                    &roles,
                    n,
                )
            })
        },
        &[2, 6, 16],
    );
}

fn verify_aggregated_balance_proof_helper(n: usize, c: &mut Criterion) {
    let label = format!("Aggregated {}-bit balance proof verification", n);

    c.bench_function_over_inputs(
        &label,
        move |b, &&m| {
            let pc_gens = PedersenGens::default();
            let bp_gens = BulletproofGens::new(n, m);
            let mut rng = rand::thread_rng();

            let (values, roles) = balanced_amounts(n, m);
            let blindings: Vec<Scalar> = (0..m).map(|_| Scalar::random(&mut rng)).collect();

            let mut transcript = Transcript::new(b"AggregateBalanceProofBenchmark");
            let (proof, commitments) = AggregateProof::prove(
                &bp_gens,
                &pc_gens,
                &mut transcript,
                &values,
                &blindings,
                &roles,
                n,
            )
            .unwrap();

            b.iter(|| {
                let mut transcript = Transcript::new(b"AggregateBalanceProofBenchmark");
                proof.verify(&bp_gens, &pc_gens, &mut transcript, &commitments, &roles, n)
            });
        },
        &[2, 6, 16],
    );
}

fn create_aggregated_balance_proof_n_8(c: &mut Criterion) {
    create_aggregated_balance_proof_helper(8, c);
}

fn create_aggregated_balance_proof_n_64(c: &mut Criterion) {
    create_aggregated_balance_proof_helper(64, c);
}

fn verify_aggregated_balance_proof_n_8(c: &mut Criterion) {
    verify_aggregated_balance_proof_helper(8, c);
}

fn verify_aggregated_balance_proof_n_64(c: &mut Criterion) {
    verify_aggregated_balance_proof_helper(64, c);
}

criterion_group! {
    name = create_abp;
    config = Criterion::default().sample_size(10);
    targets =
    create_aggregated_balance_proof_n_8,
    create_aggregated_balance_proof_n_64,
}

criterion_group! {
    name = verify_abp;
    config = Criterion::default();
    targets =
    verify_aggregated_balance_proof_n_8,
    verify_aggregated_balance_proof_n_64,
}

criterion_main!(create_abp, verify_abp);
