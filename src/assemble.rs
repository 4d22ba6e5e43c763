//! Sweep-transaction assembly and per-input legacy signing.

use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::key::Secp256k1;
use bitcoin::script::Builder;
use bitcoin::secp256k1::Message;
use bitcoin::sighash::SighashCache;
use bitcoin::transaction::Version;
use bitcoin::{
    Address, Amount, EcdsaSighashType, PrivateKey, Script, ScriptBuf, Transaction, TxIn, TxOut,
};

use crate::{Error, ScriptsBuilderExt};

/// Builds the unsigned sweep transaction: all collected inputs, one output of
/// `total - fee` to `destination`, and the transaction-level lock time that
/// the inputs' sequence values arm for CLTV.
///
/// Fails with [`Error::InsufficientFunds`] unless `total > fee`; the single
/// output amount is always positive.
pub fn assemble(
    inputs: Vec<TxIn>,
    destination: &Address,
    total: Amount,
    fee: Amount,
    lock_time: LockTime,
) -> Result<Transaction, Error> {
    if total <= fee {
        return Err(Error::InsufficientFunds { total, fee });
    }
    Ok(Transaction {
        version: Version::ONE,
        lock_time,
        input: inputs,
        output: vec![TxOut {
            value: total - fee,
            script_pubkey: destination.script_pubkey(),
        }],
    })
}

/// Signs every input of `tx` against the shared `redeem_script` with the
/// legacy SIGHASH_ALL digest, attaching `[signature, pubkey, redeem script]`
/// unlocking scripts. All-or-nothing: a failure on any input aborts the whole
/// operation and the partially built scripts are discarded.
pub fn sign_inputs(
    mut tx: Transaction,
    redeem_script: &Script,
    private_key: &PrivateKey,
) -> Result<Transaction, Error> {
    let secp = Secp256k1::new();
    let public_key = private_key.public_key(&secp);

    let mut script_sigs = Vec::with_capacity(tx.input.len());
    let cache = SighashCache::new(&tx);
    for index in 0..tx.input.len() {
        let sighash = cache
            .legacy_signature_hash(index, redeem_script, EcdsaSighashType::All.to_u32())
            .map_err(|e| Error::SigningFailed {
                input: index,
                reason: e.to_string(),
            })?;
        let signature = secp.sign_ecdsa(
            &Message::from_digest(sighash.to_byte_array()),
            &private_key.inner,
        );

        let mut sig_bytes = signature.serialize_der().to_vec();
        sig_bytes.push(EcdsaSighashType::All as u8);

        let script_sig = unlocking_script(&sig_bytes, &public_key, redeem_script).map_err(|e| {
            Error::SigningFailed {
                input: index,
                reason: e.to_string(),
            }
        })?;
        script_sigs.push(script_sig);
    }
    drop(cache);

    for (txin, script_sig) in tx.input.iter_mut().zip(script_sigs) {
        txin.script_sig = script_sig;
    }
    Ok(tx)
}

fn unlocking_script(
    signature: &[u8],
    public_key: &bitcoin::PublicKey,
    redeem_script: &Script,
) -> Result<ScriptBuf, Error> {
    Ok(Builder::new()
        .push_slice_try_from(signature)?
        .push_key(public_key)
        .push_slice_try_from(redeem_script.as_bytes())?
        .into_script())
}

/// The full contract: assemble the transaction and sign every input.
pub fn assemble_and_sign(
    inputs: Vec<TxIn>,
    destination: &Address,
    total: Amount,
    fee: Amount,
    lock_time: LockTime,
    redeem_script: &Script,
    private_key: &PrivateKey,
) -> Result<Transaction, Error> {
    let unsigned = assemble(inputs, destination, total, fee, lock_time)?;
    sign_inputs(unsigned, redeem_script, private_key)
}
