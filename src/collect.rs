//! Chain-state access and UTXO collection.
//!
//! The node is behind the [`ChainApi`] trait so the spend flow can run
//! against an in-memory fake; [`CoreRpc`] is the real implementation over
//! `bitcoincore-rpc`.

use bitcoin::{Address, Amount, OutPoint, ScriptBuf, Sequence, TxIn, Txid, Witness};
use bitcoincore_rpc::{Auth, RpcApi};
use log::debug;

use crate::Error;

/// Development placeholders, matching the node's cookie-less regtest setup.
/// Never a production default.
pub const DEFAULT_RPC_USER: &str = "user";
pub const DEFAULT_RPC_PASSWORD: &str = "password";
pub const DEFAULT_RPC_URL: &str = "localhost:18443";

const WATCH_LABEL: &str = "address_to_watch";

/// One unspent output of the watched address.
#[derive(Debug, Clone)]
pub struct Unspent {
    pub txid: Txid,
    pub vout: u32,
    pub amount: Amount,
}

/// Mempool-acceptance verdict for a raw transaction.
#[derive(Debug, Clone)]
pub struct AcceptVerdict {
    pub allowed: bool,
    pub reject_reason: Option<String>,
}

/// The chain-state operations the flows consume.
pub trait ChainApi {
    /// Registers `address` watch-only. Idempotent.
    fn watch_address(&self, address: &Address) -> Result<(), Error>;
    fn unspent_for(&self, address: &Address) -> Result<Vec<Unspent>, Error>;
    fn test_accept(&self, raw_tx: &[u8]) -> Result<AcceptVerdict, Error>;
    fn broadcast_raw(&self, raw_tx: &[u8]) -> Result<Txid, Error>;
}

pub struct CoreRpc {
    client: bitcoincore_rpc::Client,
}

impl CoreRpc {
    pub fn new(url: &str, user: &str, password: &str) -> Result<Self, Error> {
        let auth = Auth::UserPass(user.to_string(), password.to_string());
        Ok(CoreRpc {
            client: bitcoincore_rpc::Client::new(url, auth)?,
        })
    }
}

impl ChainApi for CoreRpc {
    fn watch_address(&self, address: &Address) -> Result<(), Error> {
        self.client
            .import_address(address, Some(WATCH_LABEL), Some(true))?;
        Ok(())
    }

    fn unspent_for(&self, address: &Address) -> Result<Vec<Unspent>, Error> {
        let entries =
            self.client
                .list_unspent(Some(0), Some(9_999_999), Some(&[address]), None, None)?;
        Ok(entries
            .into_iter()
            .map(|e| Unspent {
                txid: e.txid,
                vout: e.vout,
                amount: e.amount,
            })
            .collect())
    }

    fn test_accept(&self, raw_tx: &[u8]) -> Result<AcceptVerdict, Error> {
        let mut results = self.client.test_mempool_accept(&[raw_tx])?;
        let result = results.remove(0);
        Ok(AcceptVerdict {
            allowed: result.allowed,
            reject_reason: result.reject_reason,
        })
    }

    fn broadcast_raw(&self, raw_tx: &[u8]) -> Result<Txid, Error> {
        Ok(self.client.send_raw_transaction(raw_tx)?)
    }
}

/// Collects every unspent output of `address` as a transaction input carrying
/// `sequence`, plus the summed amount. An empty result is a normal state, not
/// an error; the caller decides whether anything remains to do.
pub fn collect_unspent(
    chain: &dyn ChainApi,
    address: &Address,
    sequence: Sequence,
) -> Result<(Amount, Vec<TxIn>), Error> {
    chain.watch_address(address)?;

    let mut total = Amount::ZERO;
    let mut inputs = Vec::new();
    for unspent in chain.unspent_for(address)? {
        debug!(
            "unspent: {}:{} {}",
            unspent.txid, unspent.vout, unspent.amount
        );
        total += unspent.amount;
        inputs.push(TxIn {
            previous_output: OutPoint {
                txid: unspent.txid,
                vout: unspent.vout,
            },
            script_sig: ScriptBuf::new(),
            sequence,
            witness: Witness::default(),
        });
    }
    Ok((total, inputs))
}

#[cfg(test)]
pub(crate) mod fake {
    //! Shared in-memory `ChainApi` fake, call-recording included.

    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    pub struct FakeChain {
        pub unspent: Vec<Unspent>,
        pub accept: bool,
        pub reject_reason: Option<String>,
        pub calls: RefCell<Vec<&'static str>>,
    }

    impl FakeChain {
        pub fn called(&self, name: &str) -> bool {
            self.calls.borrow().iter().any(|&c| c == name)
        }
    }

    impl ChainApi for FakeChain {
        fn watch_address(&self, _address: &Address) -> Result<(), Error> {
            self.calls.borrow_mut().push("watch_address");
            Ok(())
        }

        fn unspent_for(&self, _address: &Address) -> Result<Vec<Unspent>, Error> {
            self.calls.borrow_mut().push("unspent_for");
            Ok(self.unspent.clone())
        }

        fn test_accept(&self, _raw_tx: &[u8]) -> Result<AcceptVerdict, Error> {
            self.calls.borrow_mut().push("test_accept");
            Ok(AcceptVerdict {
                allowed: self.accept,
                reject_reason: self.reject_reason.clone(),
            })
        }

        fn broadcast_raw(&self, raw_tx: &[u8]) -> Result<Txid, Error> {
            self.calls.borrow_mut().push("broadcast_raw");
            let tx: bitcoin::Transaction =
                bitcoin::consensus::deserialize(raw_tx).expect("fake received malformed tx");
            Ok(tx.compute_txid())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeChain;
    use super::*;
    use bitcoin::Network;
    use std::str::FromStr;

    fn address() -> Address {
        let key = crate::keys::KeyMaterial::parse(
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
            false,
        )
        .unwrap();
        let script = crate::script::cltv_redeem_script(
            crate::script::parse_lock_time(20).unwrap(),
            key.pubkey_hash(),
        );
        crate::script::p2sh_address(&script, Network::Regtest).unwrap()
    }

    fn txid(tag: u8) -> Txid {
        Txid::from_str(&hex::encode([tag; 32])).unwrap()
    }

    #[test]
    fn sums_amounts_and_applies_sequence() {
        let chain = FakeChain {
            unspent: vec![
                Unspent {
                    txid: txid(1),
                    vout: 0,
                    amount: Amount::from_sat(70_000),
                },
                Unspent {
                    txid: txid(2),
                    vout: 3,
                    amount: Amount::from_sat(30_000),
                },
            ],
            ..FakeChain::default()
        };

        let sequence = Sequence::ENABLE_LOCKTIME_NO_RBF;
        let (total, inputs) = collect_unspent(&chain, &address(), sequence).unwrap();

        assert!(chain.called("watch_address"));
        assert_eq!(total, Amount::from_sat(100_000));
        assert_eq!(inputs.len(), 2);
        assert!(inputs.iter().all(|i| i.sequence == sequence));
        assert_eq!(inputs[1].previous_output, OutPoint::new(txid(2), 3));
    }

    #[test]
    fn no_unspent_outputs_is_not_an_error() {
        let chain = FakeChain::default();
        let (total, inputs) =
            collect_unspent(&chain, &address(), Sequence::ENABLE_LOCKTIME_NO_RBF).unwrap();
        assert_eq!(total, Amount::ZERO);
        assert!(inputs.is_empty());
    }
}
