//! Staged view of the ledger for a single transaction.

use std::collections::HashMap;

use auction_types::{Amount, Identity};
use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::LedgerError;

/// A ledger account: balance plus optional contract-local state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    pub balance: Amount,
    /// Borsh-encoded contract state, if a contract lives here
    pub state: Option<Vec<u8>>,
}

/// One in-flight transaction.
///
/// Reads fall through to the committed accounts; writes land in a staging
/// map that the ledger either merges or drops once the transaction ends.
pub struct Transaction<'a> {
    committed: &'a HashMap<Identity, Account>,
    staged: HashMap<Identity, Account>,
    sender: Identity,
}

impl<'a> Transaction<'a> {
    /// Open a transaction over `committed` on behalf of `sender`.
    pub fn new(committed: &'a HashMap<Identity, Account>, sender: Identity) -> Self {
        Self {
            committed,
            staged: HashMap::new(),
            sender,
        }
    }

    /// Public identity of the transaction's signer.
    pub fn sender(&self) -> Identity {
        self.sender
    }

    fn account(&self, id: &Identity) -> Option<&Account> {
        self.staged.get(id).or_else(|| self.committed.get(id))
    }

    fn account_mut(&mut self, id: &Identity) -> &mut Account {
        let committed = self.committed;
        self.staged
            .entry(*id)
            .or_insert_with(|| committed.get(id).cloned().unwrap_or_default())
    }

    /// Whether an account exists for `id`.
    pub fn exists(&self, id: &Identity) -> bool {
        self.account(id).is_some()
    }

    pub fn balance(&self, id: &Identity) -> Amount {
        self.account(id).map(|a| a.balance).unwrap_or(0)
    }

    /// Remove `amount` from `id`'s balance.
    pub fn debit(&mut self, id: &Identity, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance(id);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                account: *id,
                required: amount,
                available,
            });
        }
        self.account_mut(id).balance = available - amount;
        Ok(())
    }

    /// Add `amount` to `id`'s balance, creating the account if needed.
    pub fn credit(&mut self, id: &Identity, amount: Amount) -> Result<(), LedgerError> {
        let updated = self
            .balance(id)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(*id))?;
        self.account_mut(id).balance = updated;
        Ok(())
    }

    /// Move `amount` from `from` to `to`.
    pub fn transfer(
        &mut self,
        from: &Identity,
        to: &Identity,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    /// Create an empty account. Fails if one already exists.
    pub fn create_account(&mut self, id: &Identity) -> Result<(), LedgerError> {
        if self.exists(id) {
            return Err(LedgerError::AccountExists(*id));
        }
        self.staged.insert(*id, Account::default());
        Ok(())
    }

    /// Decode the contract state stored under `id`.
    pub fn load_state<S: BorshDeserialize>(&self, id: &Identity) -> Result<S, LedgerError> {
        let bytes = self
            .account(id)
            .and_then(|a| a.state.as_deref())
            .ok_or(LedgerError::MissingState(*id))?;
        borsh::from_slice(bytes).map_err(|e| LedgerError::StateCodec(e.to_string()))
    }

    /// Encode and store contract state under `id`.
    pub fn store_state<S: BorshSerialize>(
        &mut self,
        id: &Identity,
        state: &S,
    ) -> Result<(), LedgerError> {
        let bytes = borsh::to_vec(state).map_err(|e| LedgerError::StateCodec(e.to_string()))?;
        self.account_mut(id).state = Some(bytes);
        Ok(())
    }

    /// Consume the transaction, yielding the accounts it wrote.
    pub fn into_changes(self) -> HashMap<Identity, Account> {
        self.staged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Identity = Identity([1u8; 32]);
    const BOB: Identity = Identity([2u8; 32]);

    fn committed() -> HashMap<Identity, Account> {
        let mut accounts = HashMap::new();
        accounts.insert(
            ALICE,
            Account {
                balance: 100,
                state: None,
            },
        );
        accounts
    }

    #[test]
    fn test_reads_fall_through_to_committed() {
        let accounts = committed();
        let tx = Transaction::new(&accounts, ALICE);
        assert_eq!(tx.balance(&ALICE), 100);
        assert_eq!(tx.balance(&BOB), 0);
        assert!(tx.exists(&ALICE));
        assert!(!tx.exists(&BOB));
        assert_eq!(tx.sender(), ALICE);
    }

    #[test]
    fn test_transfer_stages_both_sides() {
        let accounts = committed();
        let mut tx = Transaction::new(&accounts, ALICE);
        tx.transfer(&ALICE, &BOB, 40).unwrap();

        assert_eq!(tx.balance(&ALICE), 60);
        assert_eq!(tx.balance(&BOB), 40);

        let changes = tx.into_changes();
        assert_eq!(changes[&ALICE].balance, 60);
        assert_eq!(changes[&BOB].balance, 40);
        // committed map untouched
        assert_eq!(accounts[&ALICE].balance, 100);
    }

    #[test]
    fn test_debit_insufficient() {
        let accounts = committed();
        let mut tx = Transaction::new(&accounts, ALICE);
        let err = tx.debit(&ALICE, 101).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                account: ALICE,
                required: 101,
                available: 100,
            }
        );
        assert_eq!(tx.balance(&ALICE), 100);
    }

    #[test]
    fn test_credit_overflow() {
        let accounts = committed();
        let mut tx = Transaction::new(&accounts, ALICE);
        assert_eq!(
            tx.credit(&ALICE, Amount::MAX),
            Err(LedgerError::BalanceOverflow(ALICE))
        );
    }

    #[test]
    fn test_create_account_twice() {
        let accounts = committed();
        let mut tx = Transaction::new(&accounts, ALICE);
        assert_eq!(
            tx.create_account(&ALICE),
            Err(LedgerError::AccountExists(ALICE))
        );
        tx.create_account(&BOB).unwrap();
        assert_eq!(
            tx.create_account(&BOB),
            Err(LedgerError::AccountExists(BOB))
        );
    }

    #[test]
    fn test_state_roundtrip_and_missing() {
        let accounts = committed();
        let mut tx = Transaction::new(&accounts, ALICE);

        assert_eq!(
            tx.load_state::<u64>(&ALICE),
            Err(LedgerError::MissingState(ALICE))
        );

        tx.store_state(&ALICE, &42u64).unwrap();
        assert_eq!(tx.load_state::<u64>(&ALICE).unwrap(), 42);
        // balance preserved alongside state
        assert_eq!(tx.balance(&ALICE), 100);
    }
}
