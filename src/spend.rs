//! The end-to-end sweep flow: rebuild the redeem script, collect UTXOs,
//! estimate the fee, assemble and sign, then gate the broadcast.
//!
//! Every user-visible line goes through the `emit` sink so the binaries can
//! both print it and record it for the output file.

use bitcoin::absolute::LockTime;
use bitcoin::key::Secp256k1;
use bitcoin::{Address, Network, PrivateKey, Sequence};
use log::{debug, info};

use crate::assemble::{assemble, sign_inputs};
use crate::broadcast::{check_and_broadcast, BroadcastResult, Confirmer};
use crate::collect::{collect_unspent, ChainApi};
use crate::fee::{estimate_fee, FeeRateSource};
use crate::script::{cltv_redeem_script, p2sh_address};
use crate::{EncodeHex, Error};

pub struct SpendParams {
    pub lock_time: LockTime,
    pub private_key: PrivateKey,
    /// The CLTV-locked P2SH address holding the funds.
    pub source: Address,
    /// Where the swept funds go.
    pub destination: Address,
    pub network: Network,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendOutcome {
    /// The source address has nothing to spend. Terminal and informational;
    /// no fee query, signing or broadcast happens.
    NoFunds,
    Completed(BroadcastResult),
}

/// Sweeps all funds of `params.source` to `params.destination` in one
/// transaction with a single output. Nothing irreversible happens before
/// [`check_and_broadcast`] transmits.
pub fn spend_all(
    chain: &dyn ChainApi,
    fees: &dyn FeeRateSource,
    confirmer: &mut dyn Confirmer,
    params: &SpendParams,
    emit: &mut dyn FnMut(String),
) -> Result<SpendOutcome, Error> {
    let secp = Secp256k1::new();
    let public_key = params.private_key.public_key(&secp);
    let redeem = cltv_redeem_script(params.lock_time, public_key.pubkey_hash());
    emit(format!(
        "The P2SH Address created by the redeem script is: {}",
        p2sh_address(&redeem, params.network)?
    ));

    // Absolute lock time: sequence must leave lock-time enforcement enabled
    // on every input, or CLTV in the redeem script cannot pass.
    let sequence = Sequence::ENABLE_LOCKTIME_NO_RBF;
    let (total, inputs) = collect_unspent(chain, &params.source, sequence)?;
    emit(format!(
        "The P2SH Address has in total {} Transactions unspent",
        inputs.len()
    ));

    if inputs.is_empty() {
        emit("There are no UTXOs for this P2SH Address".to_string());
        emit("Try again with a different one!".to_string());
        return Ok(SpendOutcome::NoFunds);
    }

    emit(format!("Total bitcoins == {}", total.to_btc()));

    let rate = fees.fastest_rate()?;
    let fee = estimate_fee(inputs.len(), rate);
    info!(
        "estimated fee for {} input(s) at {rate} sat/B: {fee}",
        inputs.len()
    );

    let unsigned = assemble(inputs, &params.destination, total, fee, params.lock_time)?;
    emit(format!(
        "Raw unsigned transaction: {}",
        bitcoin::consensus::serialize(&unsigned).hex()
    ));

    let tx = sign_inputs(unsigned, &redeem, &params.private_key)?;
    emit(format!(
        "Raw signed transaction: {}",
        bitcoin::consensus::serialize(&tx).hex()
    ));
    emit(format!("Transaction Id - TxID: {}", tx.compute_txid()));

    let result = check_and_broadcast(chain, &tx, confirmer)?;
    debug!("broadcast gate result: {result:?}");
    match &result {
        BroadcastResult::Rejected { reason } => emit(format!(
            "Unfortunately the signed raw transaction is invalid! Rejected because: {reason}"
        )),
        BroadcastResult::Cancelled => {
            emit("Transaction's broadcast has been cancelled!".to_string())
        }
        BroadcastResult::Broadcast { txid } => emit(format!(
            "The transaction with id == {txid}, has been broadcasted to the network!"
        )),
    }
    Ok(SpendOutcome::Completed(result))
}
