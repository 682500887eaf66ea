//! Balance proof command line tool
//!
//! Usage:
//! cargo run --bin balance_proof --release -- --sources 40,60 --destinations 80,10,5,5
//! cargo run --bin balance_proof --release -- --sources 300 --destinations 300 --bits 16 --hex

extern crate balance_proofs;
extern crate clap;
extern crate curve25519_dalek;
extern crate env_logger;
extern crate hex;
#[macro_use]
extern crate log;
extern crate merlin;
extern crate rand;

use balance_proofs::{AggregateProof, BulletproofGens, PedersenGens, Role};
use clap::{App, Arg};
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;
use rand::thread_rng;
use std::process;

fn main() {
    env_logger::init();

    let matches = App::new("Balance Proof")
        .version("0.1")
        .about("Proves and verifies that source amounts balance destination amounts")
        .arg(Arg::with_name("sources")
            .short("s")
            .long("sources")
            .value_name("AMOUNTS")
            .help("Comma-separated source amounts")
            .takes_value(true)
            .required(true))
        .arg(Arg::with_name("destinations")
            .short("d")
            .long("destinations")
            .value_name("AMOUNTS")
            .help("Comma-separated destination amounts")
            .takes_value(true)
            .required(true))
        .arg(Arg::with_name("bits")
            .short("b")
            .long("bits")
            .value_name("N")
            .help("Bitsize of each amount's range (default: 8)")
            .takes_value(true))
        .arg(Arg::with_name("hex")
            .long("hex")
            .help("Print the serialized proof as hex"))
        .get_matches();

    let sources = parse_amounts(matches.value_of("sources").unwrap_or(""));
    let destinations = parse_amounts(matches.value_of("destinations").unwrap_or(""));
    let n = match parse_bits(matches.value_of("bits").unwrap_or("8")) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let values: Vec<u64> = sources.iter().chain(destinations.iter()).cloned().collect();
    let roles: Vec<Role> = sources.iter().map(|_| Role::Source)
        .chain(destinations.iter().map(|_| Role::Destination))
        .collect();

    let mut rng = thread_rng();
    let blindings: Vec<Scalar> = values.iter().map(|_| Scalar::random(&mut rng)).collect();

    let pc_gens = PedersenGens::default();
    let bp_gens = BulletproofGens::new(n, values.len());

    info!("proving {} sources and {} destinations in {} bits", sources.len(), destinations.len(), n);

    let mut transcript = Transcript::new(b"balance_proof cli");
    let (proof, commitments) = match AggregateProof::prove_with_rng(
        &bp_gens, &pc_gens, &mut transcript, &values, &blindings, &roles, n, &mut rng,
    ) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Proving failed: {}", e);
            process::exit(1);
        }
    };

    let mut transcript = Transcript::new(b"balance_proof cli");
    let result = proof.verify(&bp_gens, &pc_gens, &mut transcript, &commitments, &roles, n);

    println!("Configuration: sources={:?}, destinations={:?}, bits={}", sources, destinations, n);
    println!("Group elements: {}", proof.group_element_count());
    println!("Proof size: {} bytes", proof.serialized_size());
    match result {
        Ok(()) => println!("Verification: ok"),
        Err(ref e) => println!("Verification: failed ({})", e),
    }

    if matches.is_present("hex") {
        println!("{}", hex::encode(proof.to_bytes()));
    }

    if result.is_err() {
        process::exit(2);
    }
}

/// Parses the `--bits` argument, a bitsize between 1 and 64.
fn parse_bits(arg: &str) -> Result<usize, String> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= 64 => Ok(n),
        Ok(n) => Err(format!("Bitsize must be between 1 and 64, got {}", n)),
        Err(_) => Err(format!("Not a bitsize: {}", arg)),
    }
}

fn parse_amounts(list: &str) -> Vec<u64> {
    list.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse() {
            Ok(v) => v,
            Err(_) => {
                eprintln!("Not an amount: {}", s);
                process::exit(1);
            }
        })
        .collect()
}
