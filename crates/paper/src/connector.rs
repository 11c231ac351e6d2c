use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use common::{AccountType, Broker, BrokerConnector, Credentials, Error, Result};

use crate::account::PaperAccount;
use crate::market::PaperMarket;

/// Hands out one [`PaperAccount`] per (user, account type) over a shared
/// replay market. Accounts survive across sessions of the same user.
#[derive(Debug)]
pub struct PaperConnector {
    market: Arc<PaperMarket>,
    initial_balance: f64,
    payout_ratio: f64,
    accounts: Mutex<HashMap<(String, AccountType), Arc<PaperAccount>>>,
}

impl PaperConnector {
    pub fn new(market: Arc<PaperMarket>, initial_balance: f64, payout_ratio: f64) -> Self {
        Self {
            market,
            initial_balance,
            payout_ratio,
            accounts: Mutex::new(HashMap::new()),
        }
    }

    pub fn market(&self) -> Arc<PaperMarket> {
        self.market.clone()
    }

    /// The account behind `user`'s connection, opening it if needed.
    pub async fn account(&self, user: &str, account_type: AccountType) -> Arc<PaperAccount> {
        let mut accounts = self.accounts.lock().await;
        accounts
            .entry((user.to_string(), account_type))
            .or_insert_with(|| {
                info!(%user, account = %account_type, "Opening paper account");
                Arc::new(PaperAccount::new(
                    self.market.clone(),
                    account_type,
                    self.initial_balance,
                    self.payout_ratio,
                ))
            })
            .clone()
    }
}

#[async_trait]
impl BrokerConnector for PaperConnector {
    async fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn Broker>> {
        if credentials.user.is_empty() || credentials.password.is_empty() {
            return Err(Error::Connection("missing credentials".into()));
        }
        let account: Arc<dyn Broker> = self
            .account(&credentials.user, credentials.account_type)
            .await;
        Ok(account)
    }
}
