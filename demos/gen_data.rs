//! Demo signature generator, kept out of the core recovery engine (its own
//! job is to produce attack fixtures, not to consume them). Picks a random
//! private key, signs `count` messages while leaking `bits` bits of each
//! nonce, and writes the JSON contract so the `lattice-attack` binary (or
//! the ignored end-to-end tests) can try to recover the planted key.
//!
//! Run with `cargo run --example gen_data -- -n 1000 -b 6 -c secp256k1`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use dashu::integer::UBig;
use lattice_attack::bigint::{add_mod, inv_mod, mul_mod};
use lattice_attack::curve::Curve;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use sha2::{Digest, Sha256};

#[derive(Parser, Debug)]
#[command(about = "Generate random demo data for the ECDSA lattice attack")]
struct Args {
    /// File name output
    #[arg(short = 'f', default_value = "data.json")]
    output: PathBuf,

    /// Message string
    #[arg(short = 'm', default_value = "Message Signed blah")]
    message: String,

    /// Elliptic curve name
    #[arg(short = 'c', default_value = "secp256k1")]
    curve: String,

    /// Number of known bits (at least 4)
    #[arg(short = 'b', default_value_t = 6)]
    bits: u32,

    /// Bits type: MSB or LSB
    #[arg(short = 't', default_value = "LSB")]
    known_type: String,

    /// Number of signatures to generate
    #[arg(short = 'n', default_value_t = 1000)]
    count: usize,

    /// Seed the RNG for reproducible fixtures
    #[arg(long)]
    seed: Option<u64>,
}

fn random_scalar(rng: &mut ChaCha8Rng, n: &UBig) -> UBig {
    let byte_len = (n.bit_len() + 7) / 8;
    loop {
        let mut buf = vec![0u8; byte_len];
        rng.fill_bytes(&mut buf);
        let candidate = UBig::from_be_bytes(&buf) % n;
        if candidate != UBig::ZERO {
            return candidate;
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let curve = Curve::from_name(&args.curve)?;
    let n = curve.order();
    let mut rng = match args.seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_rng(rand::thread_rng())?,
    };

    let d = random_scalar(&mut rng, &n);
    eprintln!("Private key to be found (as demo):");
    eprintln!("{d:#x}");

    let (qx, qy) = curve.derive(&d)?;
    let msg_bytes = args.message.as_bytes().to_vec();
    let h = UBig::from_be_bytes(&Sha256::digest(&msg_bytes));
    let kbi = UBig::ONE << (args.bits as usize);
    let is_lsb = args.known_type.eq_ignore_ascii_case("LSB");

    eprintln!(
        "Generating {} signatures with curve {} leaking {} bits ({})",
        args.count,
        curve.name(),
        args.bits,
        if is_lsb { "LSB" } else { "MSB" }
    );

    let mut signatures = Vec::with_capacity(args.count);
    for _ in 0..args.count {
        let k = random_scalar(&mut rng, &n);
        let (rx, _) = curve.derive(&k)?;
        let r = &rx % &n;
        let k_inv = inv_mod(&k, &n)?;
        let rd = mul_mod(&r, &d, &n);
        let s = mul_mod(&k_inv, &add_mod(&h, &rd, &n), &n);
        let kp = if is_lsb {
            &k % &kbi
        } else {
            &k >> (curve.bitsize() - args.bits) as usize
        };
        signatures.push(json!({
            "r": r.to_string(),
            "s": s.to_string(),
            "kp": kp.to_string(),
        }));
    }

    let out = json!({
        "curve": curve.name(),
        "public_key": [qx.to_string(), qy.to_string()],
        "message": msg_bytes,
        "known_type": if is_lsb { "LSB" } else { "MSB" },
        "known_bits": args.bits,
        "signatures": signatures,
    });
    std::fs::write(&args.output, serde_json::to_string_pretty(&out)?)?;
    eprintln!("File {} written with all data.", args.output.display());
    Ok(())
}
