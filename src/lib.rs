//! CLTV-locked P2SH tooling.
//!
//! Two workflows share this library: building a pay-to-script-hash address
//! whose redeem script is guarded by `OP_CHECKLOCKTIMEVERIFY`, and sweeping
//! all funds from such an address once the lock time has passed. Node access,
//! fee-rate lookup and the broadcast confirmation prompt sit behind traits so
//! the flows run against fakes in tests.

use bitcoin::script::PushBytes;
use bitcoin::Amount;
use thiserror::Error;

pub mod assemble;
pub mod broadcast;
pub mod collect;
pub mod fee;
pub mod keys;
pub mod outfile;
pub mod script;
pub mod spend;

#[derive(Debug, Error)]
pub enum Error {
    #[error("lock time {0} cannot be encoded in the script number format")]
    InvalidLockTime(i64),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("malformed script: {0}")]
    Script(String),
    #[error("fee service unavailable: {0}")]
    FeeServiceUnavailable(String),
    #[error("insufficient funds: total {total} does not cover the fee {fee}")]
    InsufficientFunds { total: Amount, fee: Amount },
    #[error("signing input {input} failed: {reason}")]
    SigningFailed { input: usize, reason: String },
    #[error("node RPC error: {0}")]
    Network(#[from] bitcoincore_rpc::Error),
}

pub trait EncodeHex {
    fn hex(&self) -> String;
}

impl<A> EncodeHex for A
where
    A: AsRef<[u8]>,
{
    fn hex(&self) -> String {
        hex::encode(self)
    }
}

pub trait ScriptsBuilderExt
where
    Self: Sized,
{
    fn push_slice_try_from(self, slice: &[u8]) -> Result<Self, Error>;
}

impl ScriptsBuilderExt for bitcoin::script::Builder {
    fn push_slice_try_from(self, slice: &[u8]) -> Result<Self, Error> {
        let push = <&PushBytes>::try_from(slice)
            .map_err(|_| Error::Script(format!("{}-byte push exceeds script limits", slice.len())))?;
        Ok(self.push_slice(push))
    }
}
