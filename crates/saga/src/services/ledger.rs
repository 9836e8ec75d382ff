//! Ledger service trait and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{AccountId, Money};
use rust_decimal::Decimal;

use crate::error::SagaError;

/// Account state as reported by the ledger lookup.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub id: AccountId,
    /// Current balance; its currency is the account's native currency,
    /// which the orchestrator adopts as the settlement currency.
    pub balance: Money,
}

/// Trait for ledger operations.
///
/// All movement calls accept a caller-supplied request ID so the
/// ledger can deduplicate retried requests. The atomic `transfer`
/// primitive debits and credits as one indivisible unit; any failure
/// of that call leaves ledger state unchanged.
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Looks up an account and its balance.
    async fn resolve_account(&self, account_id: &AccountId) -> Result<AccountSnapshot, SagaError>;

    /// Removes `amount` from the account's balance.
    async fn debit(
        &self,
        account_id: &AccountId,
        amount: &Money,
        request_id: &str,
    ) -> Result<(), SagaError>;

    /// Adds `amount` to the account's balance.
    async fn credit(
        &self,
        account_id: &AccountId,
        amount: &Money,
        request_id: &str,
    ) -> Result<(), SagaError>;

    /// Debits the source and credits the destination as one unit.
    async fn transfer(
        &self,
        source: &AccountId,
        destination: &AccountId,
        amount: &Money,
        request_id: &str,
    ) -> Result<(), SagaError>;
}

/// Opening balance given to accounts created on demand.
const OPENING_BALANCE: i64 = 1000;

/// Currency of accounts created on demand.
const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Default)]
struct InMemoryLedgerState {
    accounts: HashMap<AccountId, Money>,
    applied_requests: HashSet<String>,
    reject_credit_for: HashSet<AccountId>,
    unknown_accounts: HashSet<AccountId>,
    fail_on_transfer: bool,
}

impl InMemoryLedgerState {
    fn account_mut(&mut self, account_id: &AccountId) -> Result<&mut Money, SagaError> {
        self.accounts
            .get_mut(account_id)
            .ok_or_else(|| SagaError::AccountNotFound(account_id.clone()))
    }
}

/// In-memory ledger for the simulated environment and tests.
///
/// `resolve_account` creates unseen accounts on demand with an opening
/// balance; a real ledger would only read here.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerService {
    state: Arc<RwLock<InMemoryLedgerState>>,
}

impl InMemoryLedgerService {
    /// Creates a new in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces an account with the given balance.
    pub fn open_account(&self, account_id: &AccountId, balance: Money) {
        self.state
            .write()
            .unwrap()
            .accounts
            .insert(account_id.clone(), balance);
    }

    /// Returns the account's balance, or `None` if never seen.
    pub fn balance_of(&self, account_id: &AccountId) -> Option<Money> {
        self.state.read().unwrap().accounts.get(account_id).cloned()
    }

    /// Configures credits to the given account to be rejected.
    pub fn set_reject_credit(&self, account_id: &AccountId, reject: bool) {
        let mut state = self.state.write().unwrap();
        if reject {
            state.reject_credit_for.insert(account_id.clone());
        } else {
            state.reject_credit_for.remove(account_id);
        }
    }

    /// Configures lookups of the given account to fail, overriding the
    /// create-on-demand behavior.
    pub fn set_unknown_account(&self, account_id: &AccountId) {
        self.state
            .write()
            .unwrap()
            .unknown_accounts
            .insert(account_id.clone());
    }

    /// Configures the atomic transfer primitive to fail.
    pub fn set_fail_on_transfer(&self, fail: bool) {
        self.state.write().unwrap().fail_on_transfer = fail;
    }
}

fn check_currency(account: &Money, amount: &Money) -> Result<(), SagaError> {
    if account.currency != amount.currency {
        return Err(SagaError::LedgerService("CURRENCY_MISMATCH".to_string()));
    }
    Ok(())
}

#[async_trait]
impl LedgerService for InMemoryLedgerService {
    async fn resolve_account(&self, account_id: &AccountId) -> Result<AccountSnapshot, SagaError> {
        let mut state = self.state.write().unwrap();
        if state.unknown_accounts.contains(account_id) {
            return Err(SagaError::AccountNotFound(account_id.clone()));
        }
        let balance = state
            .accounts
            .entry(account_id.clone())
            .or_insert_with(|| Money::new(Decimal::from(OPENING_BALANCE), DEFAULT_CURRENCY))
            .clone();
        Ok(AccountSnapshot {
            id: account_id.clone(),
            balance,
        })
    }

    async fn debit(
        &self,
        account_id: &AccountId,
        amount: &Money,
        request_id: &str,
    ) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();
        if state.applied_requests.contains(request_id) {
            return Ok(());
        }
        let balance = state.account_mut(account_id)?;
        check_currency(balance, amount)?;
        if balance.value < amount.value {
            return Err(SagaError::LedgerService("INSUFFICIENT_FUNDS".to_string()));
        }
        balance.value -= amount.value;
        state.applied_requests.insert(request_id.to_string());
        Ok(())
    }

    async fn credit(
        &self,
        account_id: &AccountId,
        amount: &Money,
        request_id: &str,
    ) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();
        if state.applied_requests.contains(request_id) {
            return Ok(());
        }
        if state.reject_credit_for.contains(account_id) {
            return Err(SagaError::LedgerService("CREDIT_REJECTED".to_string()));
        }
        let balance = state.account_mut(account_id)?;
        check_currency(balance, amount)?;
        balance.value += amount.value;
        state.applied_requests.insert(request_id.to_string());
        Ok(())
    }

    async fn transfer(
        &self,
        source: &AccountId,
        destination: &AccountId,
        amount: &Money,
        request_id: &str,
    ) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();
        if state.applied_requests.contains(request_id) {
            return Ok(());
        }
        if state.fail_on_transfer {
            return Err(SagaError::LedgerService("TRANSFER_REJECTED".to_string()));
        }
        if state.reject_credit_for.contains(destination) {
            return Err(SagaError::LedgerService("CREDIT_REJECTED".to_string()));
        }

        // Validate both legs before touching either balance
        let source_balance = state
            .accounts
            .get(source)
            .ok_or_else(|| SagaError::AccountNotFound(source.clone()))?;
        check_currency(source_balance, amount)?;
        if source_balance.value < amount.value {
            return Err(SagaError::LedgerService("INSUFFICIENT_FUNDS".to_string()));
        }
        let destination_balance = state
            .accounts
            .get(destination)
            .ok_or_else(|| SagaError::AccountNotFound(destination.clone()))?;
        check_currency(destination_balance, amount)?;

        state.account_mut(source)?.value -= amount.value;
        state.account_mut(destination)?.value += amount.value;
        state.applied_requests.insert(request_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(value: i64) -> Money {
        Money::new(Decimal::from(value), "USD")
    }

    #[tokio::test]
    async fn resolve_creates_account_with_opening_balance() {
        let ledger = InMemoryLedgerService::new();
        let account = AccountId::new("acc-1");

        let snapshot = ledger.resolve_account(&account).await.unwrap();
        assert_eq!(snapshot.balance, usd(OPENING_BALANCE));
        assert_eq!(ledger.balance_of(&account), Some(usd(OPENING_BALANCE)));
    }

    #[tokio::test]
    async fn unknown_account_fails_resolution() {
        let ledger = InMemoryLedgerService::new();
        let account = AccountId::new("acc-missing");
        ledger.set_unknown_account(&account);

        let result = ledger.resolve_account(&account).await;
        assert!(matches!(result, Err(SagaError::AccountNotFound(_))));
    }

    #[tokio::test]
    async fn debit_and_credit_move_balance() {
        let ledger = InMemoryLedgerService::new();
        let account = AccountId::new("acc-1");
        ledger.open_account(&account, usd(500));

        ledger.debit(&account, &usd(200), "req-1").await.unwrap();
        assert_eq!(ledger.balance_of(&account), Some(usd(300)));

        ledger.credit(&account, &usd(50), "req-2").await.unwrap();
        assert_eq!(ledger.balance_of(&account), Some(usd(350)));
    }

    #[tokio::test]
    async fn debit_rejects_insufficient_funds() {
        let ledger = InMemoryLedgerService::new();
        let account = AccountId::new("acc-1");
        ledger.open_account(&account, usd(100));

        let result = ledger.debit(&account, &usd(200), "req-1").await;
        assert!(matches!(result, Err(SagaError::LedgerService(ref r)) if r == "INSUFFICIENT_FUNDS"));
        assert_eq!(ledger.balance_of(&account), Some(usd(100)));
    }

    #[tokio::test]
    async fn duplicate_request_id_applies_once() {
        let ledger = InMemoryLedgerService::new();
        let account = AccountId::new("acc-1");
        ledger.open_account(&account, usd(500));

        ledger.debit(&account, &usd(100), "req-1").await.unwrap();
        ledger.debit(&account, &usd(100), "req-1").await.unwrap();
        assert_eq!(ledger.balance_of(&account), Some(usd(400)));
    }

    #[tokio::test]
    async fn rejected_credit() {
        let ledger = InMemoryLedgerService::new();
        let account = AccountId::new("acc-1");
        ledger.open_account(&account, usd(100));
        ledger.set_reject_credit(&account, true);

        let result = ledger.credit(&account, &usd(50), "req-1").await;
        assert!(matches!(result, Err(SagaError::LedgerService(ref r)) if r == "CREDIT_REJECTED"));
        assert_eq!(ledger.balance_of(&account), Some(usd(100)));
    }

    #[tokio::test]
    async fn transfer_moves_both_balances() {
        let ledger = InMemoryLedgerService::new();
        let source = AccountId::new("acc-src");
        let destination = AccountId::new("acc-dst");
        ledger.open_account(&source, usd(1000));
        ledger.open_account(&destination, usd(1000));

        ledger
            .transfer(&source, &destination, &usd(100), "req-1")
            .await
            .unwrap();
        assert_eq!(ledger.balance_of(&source), Some(usd(900)));
        assert_eq!(ledger.balance_of(&destination), Some(usd(1100)));
    }

    #[tokio::test]
    async fn failed_transfer_leaves_balances_unchanged() {
        let ledger = InMemoryLedgerService::new();
        let source = AccountId::new("acc-src");
        let destination = AccountId::new("acc-dst");
        ledger.open_account(&source, usd(1000));
        ledger.open_account(&destination, usd(1000));
        ledger.set_reject_credit(&destination, true);

        let result = ledger
            .transfer(&source, &destination, &usd(100), "req-1")
            .await;
        assert!(result.is_err());
        assert_eq!(ledger.balance_of(&source), Some(usd(1000)));
        assert_eq!(ledger.balance_of(&destination), Some(usd(1000)));
    }

    #[tokio::test]
    async fn currency_mismatch_is_rejected() {
        let ledger = InMemoryLedgerService::new();
        let account = AccountId::new("acc-eur");
        ledger.open_account(&account, Money::new(Decimal::from(100), "EUR"));

        let result = ledger.debit(&account, &usd(10), "req-1").await;
        assert!(matches!(result, Err(SagaError::LedgerService(ref r)) if r == "CURRENCY_MISMATCH"));
    }
}
