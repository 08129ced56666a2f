//! In-memory ledger.

use std::collections::HashMap;

use auction_types::{Amount, Identity, Keypair};
use borsh::BorshDeserialize;
use parking_lot::Mutex;
use rand::rngs::OsRng;
use tracing::{debug, info};

use crate::error::LedgerError;
use crate::transaction::{Account, Transaction};
use crate::Ledger;

/// Ledger kept entirely in memory.
///
/// The account map sits behind one mutex that is held for the full
/// duration of [`Ledger::execute`], so transactions are applied strictly
/// one after another.
#[derive(Debug, Default)]
pub struct LocalLedger {
    accounts: Mutex<HashMap<Identity, Account>>,
}

impl LocalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger with pre-funded accounts.
    pub fn with_genesis(balances: impl IntoIterator<Item = (Identity, Amount)>) -> Self {
        let accounts = balances
            .into_iter()
            .map(|(id, balance)| {
                (
                    id,
                    Account {
                        balance,
                        state: None,
                    },
                )
            })
            .collect();
        Self {
            accounts: Mutex::new(accounts),
        }
    }

    /// Mint `amount` into `identity`, returning the new balance.
    pub fn fund(&self, identity: &Identity, amount: Amount) -> Result<Amount, LedgerError> {
        let mut accounts = self.accounts.lock();
        let account = accounts.entry(*identity).or_default();
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(*identity))?;
        info!("Funded {} with {}", identity.short(), amount);
        Ok(account.balance)
    }

    /// Snapshot of all balances, ordered by identity.
    pub fn accounts(&self) -> Vec<(Identity, Amount)> {
        let mut balances: Vec<_> = self
            .accounts
            .lock()
            .iter()
            .map(|(id, account)| (*id, account.balance))
            .collect();
        balances.sort_unstable();
        balances
    }
}

impl Ledger for LocalLedger {
    fn balance(&self, identity: &Identity) -> Amount {
        self.accounts
            .lock()
            .get(identity)
            .map(|a| a.balance)
            .unwrap_or(0)
    }

    fn new_identity(&self) -> Keypair {
        Keypair::generate(&mut OsRng)
    }

    fn execute<T, E, F>(&self, signer: &Keypair, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
    {
        let mut accounts = self.accounts.lock();
        let mut tx = Transaction::new(&accounts, signer.public());

        match f(&mut tx) {
            Ok(value) => {
                let changes = tx.into_changes();
                debug!(
                    "Committed transaction from {} touching {} account(s)",
                    signer.public().short(),
                    changes.len()
                );
                accounts.extend(changes);
                Ok(value)
            }
            Err(e) => {
                debug!("Rolled back transaction from {}", signer.public().short());
                Err(e)
            }
        }
    }

    fn load_state<S: BorshDeserialize>(&self, account: &Identity) -> Result<S, LedgerError> {
        let accounts = self.accounts.lock();
        let bytes = accounts
            .get(account)
            .and_then(|a| a.state.as_deref())
            .ok_or(LedgerError::MissingState(*account))?;
        borsh::from_slice(bytes).map_err(|e| LedgerError::StateCodec(e.to_string()))
    }
}
