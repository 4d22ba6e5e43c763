//! The CLTV redeem script template and its P2SH address.
//!
//! Script layout:
//!
//! ```text
//! <lock-time> OP_CLTV OP_DROP
//! OP_DUP OP_HASH160 <pubkey-hash> OP_EQUALVERIFY OP_CHECKSIG
//! ```
//!
//! Only the address (the script's hash) is stored anywhere, so the spender
//! must rebuild the byte-identical script later. The builder's minimal
//! script-number encoding keeps the output deterministic.

use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::opcodes::all::{OP_CHECKSIG, OP_CLTV, OP_DROP, OP_DUP, OP_EQUALVERIFY, OP_HASH160};
use bitcoin::script::Builder;
use bitcoin::{Address, Network, PubkeyHash, Script, ScriptBuf};

use crate::Error;

/// Validates a raw lock-time value against the 32-bit consensus field.
///
/// Whether the value means a block height or a Unix timestamp is decided by
/// the chain (below 500,000,000 it is a height), not here; the caller passes
/// whatever it intends the chain to enforce.
pub fn parse_lock_time(value: i64) -> Result<LockTime, Error> {
    let consensus = u32::try_from(value).map_err(|_| Error::InvalidLockTime(value))?;
    Ok(LockTime::from_consensus(consensus))
}

/// Builds the CLTV redeem script. Byte-identical output for identical inputs.
pub fn cltv_redeem_script(lock_time: LockTime, pubkey_hash: PubkeyHash) -> ScriptBuf {
    Builder::new()
        .push_lock_time(lock_time)
        .push_opcode(OP_CLTV)
        .push_opcode(OP_DROP)
        .push_opcode(OP_DUP)
        .push_opcode(OP_HASH160)
        .push_slice(pubkey_hash.to_byte_array())
        .push_opcode(OP_EQUALVERIFY)
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

/// Hashes a redeem script into its P2SH address on the given network.
pub fn p2sh_address(script: &Script, network: Network) -> Result<Address, Error> {
    Address::p2sh(script, network).map_err(|e| Error::Script(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyMaterial;

    // the secp256k1 generator point, a known-valid public key
    const PUBKEY: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn pubkey_hash() -> PubkeyHash {
        KeyMaterial::parse(PUBKEY, false).unwrap().pubkey_hash()
    }

    #[test]
    fn redeem_script_is_deterministic() {
        let lock_time = parse_lock_time(500_000_123).unwrap();
        let a = cltv_redeem_script(lock_time, pubkey_hash());
        let b = cltv_redeem_script(lock_time, pubkey_hash());
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn block_height_20_script_layout() {
        use hex_literal::hex;

        let script = cltv_redeem_script(parse_lock_time(20).unwrap(), pubkey_hash());
        // <20> CLTV DROP DUP HASH160 <20-byte push>
        let mut expected = hex!("0114b17576a914").to_vec();
        expected.extend_from_slice(pubkey_hash().as_byte_array());
        // EQUALVERIFY CHECKSIG
        expected.extend_from_slice(&hex!("88ac"));
        assert_eq!(script.as_bytes(), &expected[..]);
    }

    #[test]
    fn p2sh_address_is_stable_across_runs() {
        let script = cltv_redeem_script(parse_lock_time(20).unwrap(), pubkey_hash());
        let first = p2sh_address(&script, Network::Regtest).unwrap().to_string();
        let again = p2sh_address(&script, Network::Regtest).unwrap().to_string();
        assert_eq!(first, again);

        // address is a function of the script bytes only
        let copy = ScriptBuf::from_bytes(script.to_bytes());
        assert_eq!(
            first,
            p2sh_address(&copy, Network::Regtest).unwrap().to_string()
        );
    }

    #[test]
    fn out_of_range_lock_times_are_rejected() {
        assert!(matches!(parse_lock_time(-1), Err(Error::InvalidLockTime(-1))));
        assert!(matches!(
            parse_lock_time(i64::from(u32::MAX) + 1),
            Err(Error::InvalidLockTime(_))
        ));
        assert!(parse_lock_time(0).is_ok());
        assert!(parse_lock_time(i64::from(u32::MAX)).is_ok());
    }
}
