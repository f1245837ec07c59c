//! Derivation and signing benchmarks
//!
//! Mnemonic to seed is PBKDF2 with 2048 rounds and dominates wallet creation.

use btc_hd_wallet::blockchain::bitcoin::BitcoinKeypair;
use btc_hd_wallet::core::bip44::derive_account_keypair;
use btc_hd_wallet::core::wallet::mnemonic::{derive_seed, parse_mnemonic};
use btc_hd_wallet::core::BitcoinNetwork;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const PHRASE: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn bench_mnemonic_to_seed(c: &mut Criterion) {
    let mnemonic = parse_mnemonic(PHRASE).expect("valid mnemonic");
    c.bench_function("mnemonic_to_seed", |b| {
        b.iter(|| derive_seed(black_box(&mnemonic), black_box("")))
    });
}

fn bench_account_derivation(c: &mut Criterion) {
    let seed = derive_seed(&parse_mnemonic(PHRASE).expect("valid mnemonic"), "");
    c.bench_function("derive_account_keypair", |b| {
        b.iter(|| derive_account_keypair(black_box(&seed), black_box(7)).expect("derive failed"))
    });
}

fn bench_digest_signing(c: &mut Criterion) {
    let seed = derive_seed(&parse_mnemonic(PHRASE).expect("valid mnemonic"), "");
    let key_pair = derive_account_keypair(&seed, 0).expect("derive failed");
    let keypair = BitcoinKeypair::from_key_pair(&key_pair, BitcoinNetwork::Testnet);
    let digest = [0x42u8; 32];
    c.bench_function("sign_digest", |b| {
        b.iter(|| keypair.sign_digest(black_box(digest)).expect("sign failed"))
    });
}

criterion_group!(benches, bench_mnemonic_to_seed, bench_account_derivation, bench_digest_signing);
criterion_main!(benches);
