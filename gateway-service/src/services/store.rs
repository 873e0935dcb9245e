//! Account record store.

use anyhow::anyhow;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use gateway_core::error::AppError;
use uuid::Uuid;

use crate::models::Account;

/// Persistence seam for account records.
///
/// `update` must apply the mutation atomically with respect to concurrent
/// updates of the same account id: the closure observes the latest record
/// and no other writer runs between its read and its write. Different
/// accounts never contend on a shared lock.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find(&self, account_id: Uuid) -> Result<Option<Account>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    /// Insert a new account. Fails with a conflict when the email is taken.
    async fn insert(&self, account: Account) -> Result<Account, AppError>;

    /// Atomically mutate the account record, returning the updated copy.
    async fn update(
        &self,
        account_id: Uuid,
        mutate: &mut (dyn for<'a> FnMut(&'a mut Account) + Send),
    ) -> Result<Account, AppError>;
}

/// In-memory store backed by `DashMap`. Holding the shard guard for the
/// duration of the mutation closure gives per-account read-modify-write
/// atomicity; the closure is synchronous so the guard is never held
/// across an await point.
pub struct InMemoryAccountStore {
    accounts: DashMap<Uuid, Account>,
    email_index: DashMap<String, Uuid>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            email_index: DashMap::new(),
        }
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find(&self, account_id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self
            .accounts
            .get(&account_id)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account_id = match self.email_index.get(&email.to_lowercase()) {
            Some(entry) => *entry.value(),
            None => return Ok(None),
        };
        self.find(account_id).await
    }

    async fn insert(&self, account: Account) -> Result<Account, AppError> {
        // The entry guard makes the email uniqueness check and the index
        // write a single atomic step.
        match self.email_index.entry(account.email.to_lowercase()) {
            Entry::Occupied(_) => Err(AppError::Conflict(anyhow!(
                "an account with this email already exists"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(account.id);
                self.accounts.insert(account.id, account.clone());
                Ok(account)
            }
        }
    }

    async fn update(
        &self,
        account_id: Uuid,
        mutate: &mut (dyn for<'a> FnMut(&'a mut Account) + Send),
    ) -> Result<Account, AppError> {
        match self.accounts.get_mut(&account_id) {
            Some(mut entry) => {
                mutate(entry.value_mut());
                Ok(entry.value().clone())
            }
            None => Err(AppError::AccountNotFound(account_id)),
        }
    }
}
