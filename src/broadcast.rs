//! The broadcast gate: mempool-acceptance check, then an explicit operator
//! confirmation before anything touches the network.

use std::io::{stdin, stdout, BufRead, Write};

use bitcoin::{consensus, Transaction, Txid};

use crate::collect::ChainApi;
use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastResult {
    /// The node would not accept the transaction. Expected and reportable,
    /// e.g. while the lock time has not passed yet.
    Rejected { reason: String },
    /// The operator declined.
    Cancelled,
    Broadcast { txid: Txid },
}

/// Yes/no prompt abstraction. The real one blocks on stdin.
pub trait Confirmer {
    fn confirm(&mut self, prompt: &str) -> bool;
}

pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&mut self, prompt: &str) -> bool {
        read_confirmation(&mut stdin().lock(), &mut stdout(), prompt)
    }
}

/// Reads y/Y or n/N; anything else re-prompts. There is no default answer
/// and no timeout.
fn read_confirmation(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> bool {
    loop {
        write!(output, "{prompt}").unwrap();
        output.flush().unwrap();
        let mut line = String::new();
        if input.read_line(&mut line).unwrap_or(0) == 0 {
            // closed input stream: treat as a decline rather than guessing
            return false;
        }
        match line.trim() {
            "y" | "Y" => return true,
            "n" | "N" => return false,
            _ => writeln!(output, "\nInvalid input. Try again!").unwrap(),
        }
    }
}

/// Submits `tx` to the node's mempool-acceptance test and, only if the node
/// allows it *and* the operator confirms, transmits it.
pub fn check_and_broadcast(
    chain: &dyn ChainApi,
    tx: &Transaction,
    confirmer: &mut dyn Confirmer,
) -> Result<BroadcastResult, Error> {
    let raw = consensus::serialize(tx);

    let verdict = chain.test_accept(&raw)?;
    if !verdict.allowed {
        return Ok(BroadcastResult::Rejected {
            reason: verdict
                .reject_reason
                .unwrap_or_else(|| "no reason given".to_string()),
        });
    }

    if !confirmer.confirm("\nBroadcast the transaction to the network? (y / n) : ") {
        return Ok(BroadcastResult::Cancelled);
    }

    let txid = chain.broadcast_raw(&raw)?;
    Ok(BroadcastResult::Broadcast { txid })
}

#[cfg(test)]
pub(crate) mod fake {
    use super::Confirmer;

    /// Answers every prompt the same way, recording how often it was asked.
    pub struct FixedAnswer(pub bool, pub usize);

    impl FixedAnswer {
        pub fn new(answer: bool) -> Self {
            FixedAnswer(answer, 0)
        }
    }

    impl Confirmer for FixedAnswer {
        fn confirm(&mut self, _prompt: &str) -> bool {
            self.1 += 1;
            self.0
        }
    }
}
