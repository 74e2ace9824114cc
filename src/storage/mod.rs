// src/storage/mod.rs
use crate::core::ledger::Account;
use crate::error::StoreError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[async_trait]
pub trait StateStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<Account>, StoreError>;

    async fn save(&self, account: &Account) -> Result<(), StoreError>;
}

/// Whole-account snapshot in a single pretty-printed JSON file.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self) -> Result<Option<Account>, StoreError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let account: Account = serde_json::from_str(&data)?;
        account
            .check_consistency()
            .map_err(StoreError::Inconsistent)?;
        Ok(Some(account))
    }

    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(account)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, data).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

/// Restores the saved account, or starts fresh when the file is missing or unreadable.
pub async fn restore_account(
    store: &dyn StateStore,
    initial_capital: Decimal,
    tickers: &[String],
) -> Account {
    match store.load().await {
        Ok(Some(mut account)) => {
            account.reconcile(tickers);
            info!(
                "Restored state: balance {}, {} open positions, {} trades in history",
                account.balance,
                account.open_positions(),
                account.history.len()
            );
            account
        }
        Ok(None) => {
            info!("No saved state, starting with {}", initial_capital);
            Account::new(initial_capital, tickers)
        }
        Err(e) => {
            warn!("Saved state unreadable ({}), starting fresh", e);
            Account::new(initial_capital, tickers)
        }
    }
}
