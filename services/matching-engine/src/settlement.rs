//! Settlement seam between the matching engine and the token ledger
//!
//! The engine never moves balances itself. For every operation it builds the
//! complete batch of transfers, asks the bridge to check each debit's
//! allowance, then hands the batch over in one `settle` call. Book state is
//! only committed after `settle` succeeds, so a rejected batch leaves the
//! book exactly as it was.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::errors::SettlementError;
use types::ids::{AccountId, TokenId};
use types::numeric::Amount;

/// One token movement between two accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub token: TokenId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

/// Token-transfer capability supplied by the surrounding ledger
pub trait SettlementBridge {
    /// Authorization check run for every transfer before `settle`
    fn check_allowance(&self, transfer: &Transfer) -> Result<(), SettlementError>;

    /// Apply every transfer or none of them
    fn settle(&mut self, transfers: &[Transfer]) -> Result<(), SettlementError>;

    /// Check every transfer's allowance, then settle the batch
    fn settle_authorized(&mut self, transfers: &[Transfer]) -> Result<(), SettlementError> {
        transfers.iter().try_for_each(|t| self.check_allowance(t))?;
        self.settle(transfers)
    }
}

impl<T: SettlementBridge + ?Sized> SettlementBridge for Box<T> {
    fn check_allowance(&self, transfer: &Transfer) -> Result<(), SettlementError> {
        (**self).check_allowance(transfer)
    }

    fn settle(&mut self, transfers: &[Transfer]) -> Result<(), SettlementError> {
        (**self).settle(transfers)
    }

    fn settle_authorized(&mut self, transfers: &[Transfer]) -> Result<(), SettlementError> {
        (**self).settle_authorized(transfers)
    }
}

/// Bridge shared between books, locked once per batch
impl<T: SettlementBridge + ?Sized> SettlementBridge for &Mutex<T> {
    fn check_allowance(&self, transfer: &Transfer) -> Result<(), SettlementError> {
        self.lock().check_allowance(transfer)
    }

    fn settle(&mut self, transfers: &[Transfer]) -> Result<(), SettlementError> {
        self.lock().settle(transfers)
    }

    fn settle_authorized(&mut self, transfers: &[Transfer]) -> Result<(), SettlementError> {
        self.lock().settle_authorized(transfers)
    }
}

type LedgerKey = (AccountId, TokenId);

/// Balance/allowance ledger held in memory
///
/// Balances are tracked by (account, token). An allowance is what the owner
/// has approved the exchange to debit on its behalf; every settled debit
/// consumes allowance as well as balance.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    balances: HashMap<LedgerKey, Amount>,
    allowances: HashMap<LedgerKey, Amount>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `token` to `account`
    pub fn deposit(
        &mut self,
        account: AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), SettlementError> {
        let balance = self.balances.entry((account, token.clone())).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(SettlementError::Overflow)?;
        Ok(())
    }

    /// Set how much of `token` the exchange may debit from `account`
    pub fn approve(&mut self, account: AccountId, token: &TokenId, amount: Amount) {
        self.allowances.insert((account, token.clone()), amount);
    }

    /// Deposit and approve the same amount in one step
    pub fn fund(
        &mut self,
        account: AccountId,
        token: &TokenId,
        amount: Amount,
    ) -> Result<(), SettlementError> {
        self.deposit(account, token, amount)?;
        let approved = self.allowance(&account, token);
        self.approve(
            account,
            token,
            approved.checked_add(amount).ok_or(SettlementError::Overflow)?,
        );
        Ok(())
    }

    pub fn balance_of(&self, account: &AccountId, token: &TokenId) -> Amount {
        self.balances
            .get(&(*account, token.clone()))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    pub fn allowance(&self, account: &AccountId, token: &TokenId) -> Amount {
        self.allowances
            .get(&(*account, token.clone()))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Sum of all balances held in `token`
    pub fn total_supply(&self, token: &TokenId) -> Amount {
        self.balances
            .iter()
            .filter(|((_, t), _)| t == token)
            .fold(Amount::ZERO, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    fn apply(
        &mut self,
        transfer: &Transfer,
        undo: &mut Vec<(LedgerKey, Amount, Amount)>,
    ) -> Result<(), SettlementError> {
        let from_key = (transfer.from, transfer.token.clone());
        let to_key = (transfer.to, transfer.token.clone());

        let available = self.balances.get(&from_key).copied().unwrap_or(Amount::ZERO);
        let approved = self.allowances.get(&from_key).copied().unwrap_or(Amount::ZERO);
        let new_balance = available.checked_sub(transfer.amount).ok_or_else(|| {
            SettlementError::InsufficientBalance {
                token: transfer.token.to_string(),
                required: transfer.amount.to_string(),
                available: available.to_string(),
            }
        })?;
        let new_allowance = approved.checked_sub(transfer.amount).ok_or_else(|| {
            SettlementError::InsufficientAllowance {
                token: transfer.token.to_string(),
                required: transfer.amount.to_string(),
                approved: approved.to_string(),
            }
        })?;

        let to_balance = self.balances.get(&to_key).copied().unwrap_or(Amount::ZERO);
        undo.push((to_key.clone(), to_balance, self.allowance(&to_key.0, &to_key.1)));
        undo.push((from_key.clone(), available, approved));

        self.balances.insert(from_key.clone(), new_balance);
        self.allowances.insert(from_key, new_allowance);

        // Re-read: `to` may be the same account as `from`
        let to_balance = self.balances.get(&to_key).copied().unwrap_or(Amount::ZERO);
        let credited = to_balance
            .checked_add(transfer.amount)
            .ok_or(SettlementError::Overflow)?;
        self.balances.insert(to_key, credited);
        Ok(())
    }

    fn rollback(&mut self, undo: Vec<(LedgerKey, Amount, Amount)>) {
        for (key, balance, allowance) in undo.into_iter().rev() {
            self.balances.insert(key.clone(), balance);
            self.allowances.insert(key, allowance);
        }
    }
}

impl SettlementBridge for InMemoryLedger {
    fn check_allowance(&self, transfer: &Transfer) -> Result<(), SettlementError> {
        let approved = self.allowance(&transfer.from, &transfer.token);
        if approved < transfer.amount {
            return Err(SettlementError::InsufficientAllowance {
                token: transfer.token.to_string(),
                required: transfer.amount.to_string(),
                approved: approved.to_string(),
            });
        }
        Ok(())
    }

    fn settle(&mut self, transfers: &[Transfer]) -> Result<(), SettlementError> {
        let mut undo = Vec::with_capacity(transfers.len() * 2);
        for transfer in transfers {
            if let Err(err) = self.apply(transfer, &mut undo) {
                self.rollback(undo);
                return Err(err);
            }
        }
        debug!(transfers = transfers.len(), "Ledger batch settled");
        Ok(())
    }
}

/// Bridge that accepts every batch and keeps a journal of it
///
/// Useful for replays and simulations where balances are tracked elsewhere.
#[derive(Debug, Default, Clone)]
pub struct RecordingSettlement {
    pub journal: Vec<Transfer>,
}

impl SettlementBridge for RecordingSettlement {
    fn check_allowance(&self, _transfer: &Transfer) -> Result<(), SettlementError> {
        Ok(())
    }

    fn settle(&mut self, transfers: &[Transfer]) -> Result<(), SettlementError> {
        self.journal.extend_from_slice(transfers);
        Ok(())
    }
}
