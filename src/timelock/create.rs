//! Creates a CLTV-locked P2SH address from a public (or private) key.
//!
//! All funds sent to the printed address stay locked until the given block
//! height or Unix time passes.

use bitcoin::Network;
use clap::Parser;
use log::info;
use timelock_p2sh::keys::KeyMaterial;
use timelock_p2sh::outfile::append_lines;
use timelock_p2sh::script::{cltv_redeem_script, p2sh_address, parse_lock_time};

#[derive(Parser)]
#[command(name = "timelock-create")]
struct Args {
    /// Hex public key, or a WIF private key together with --private
    #[arg(short, long)]
    key: String,
    /// Absolute lock time: block height below 500,000,000, Unix time otherwise
    #[arg(short, long)]
    time: i64,
    /// Treat the supplied key as a private key
    #[arg(short, long)]
    private: bool,
    /// Append the resulting address to this file (".txt" added when missing)
    #[arg(short, long)]
    output: Option<String>,
    #[arg(short, long, default_value = "regtest")]
    network: Network,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let lock_time = parse_lock_time(args.time)?;
    let key = KeyMaterial::parse(&args.key, args.private)?;

    let redeem = cltv_redeem_script(lock_time, key.pubkey_hash());
    info!("redeem script: {}", redeem);
    info!(
        "lock time {} is interpreted as a {}",
        args.time,
        if lock_time.is_block_height() {
            "block height"
        } else {
            "Unix timestamp"
        }
    );

    let address = p2sh_address(&redeem, args.network)?;
    println!("The corresponding P2SH Address is: {address}");

    if let Some(output) = &args.output {
        append_lines(output, &[address.to_string()])?;
    }
    Ok(())
}
