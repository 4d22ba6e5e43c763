//! Sweeps all funds from a CLTV-locked P2SH address to a plain address.
//!
//! Collects every UTXO of the source address, pays them minus an estimated
//! fee to the destination in a single-output transaction, signs each input
//! against the rebuilt redeem script, checks mempool acceptance and only
//! broadcasts after an explicit confirmation.

use anyhow::anyhow;
use bitcoin::{Address, Network, PrivateKey};
use clap::Parser;
use timelock_p2sh::broadcast::StdinConfirmer;
use timelock_p2sh::collect::{CoreRpc, DEFAULT_RPC_PASSWORD, DEFAULT_RPC_URL, DEFAULT_RPC_USER};
use timelock_p2sh::fee::EarnFeeApi;
use timelock_p2sh::outfile::append_lines;
use timelock_p2sh::script::parse_lock_time;
use timelock_p2sh::spend::{spend_all, SpendParams};
use timelock_p2sh::Error;

#[derive(Parser)]
#[command(name = "timelock-spend")]
struct Args {
    /// WIF private key for the locked funds
    #[arg(short, long)]
    key: String,
    /// The lock time the address was created with
    #[arg(short, long)]
    time: i64,
    /// The P2SH address holding the funds
    #[arg(short, long)]
    source: String,
    /// The address receiving the funds
    #[arg(short, long)]
    destination: String,
    /// RPC user for the node
    #[arg(short, long, default_value = DEFAULT_RPC_USER)]
    user: String,
    /// RPC password for the node
    #[arg(short, long, default_value = DEFAULT_RPC_PASSWORD)]
    pswd: String,
    #[arg(long, default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
    /// Append all printed messages to this file (".txt" added when missing)
    #[arg(short, long)]
    output: Option<String>,
    #[arg(short, long, default_value = "regtest")]
    network: Network,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut messages = Vec::new();
    let result = run(&args, &mut messages);
    // failures still leave everything printed so far in the output file
    if let Some(output) = &args.output {
        append_lines(output, &messages)?;
    }
    result
}

fn run(args: &Args, messages: &mut Vec<String>) -> anyhow::Result<()> {
    let private_key =
        PrivateKey::from_wif(&args.key).map_err(|e| Error::InvalidKey(e.to_string()))?;
    let params = SpendParams {
        lock_time: parse_lock_time(args.time)?,
        private_key,
        source: parse_address(&args.source, args.network)?,
        destination: parse_address(&args.destination, args.network)?,
        network: args.network,
    };

    let chain = CoreRpc::new(&args.rpc_url, &args.user, &args.pswd)?;
    let fees = EarnFeeApi::default();

    spend_all(&chain, &fees, &mut StdinConfirmer, &params, &mut |line| {
        println!("{line}");
        messages.push(line);
    })?;
    Ok(())
}

fn parse_address(address: &str, network: Network) -> anyhow::Result<Address> {
    address
        .parse::<Address<_>>()?
        .require_network(network)
        .map_err(|e| anyhow!("{address}: {e}"))
}
