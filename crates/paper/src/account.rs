use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{
    AccountType, Candle, CandleSource, Direction, Error, Result, TradeExecutor, TradePlacement,
};

use crate::market::PaperMarket;

#[derive(Debug, Clone)]
struct OpenTrade {
    instrument: String,
    direction: Direction,
    amount: f64,
    entry: f64,
    payout: Option<f64>,
}

/// Simulated binary-options account for one user.
///
/// The stake leaves the balance when the trade is placed. On settlement a
/// win returns stake plus `amount · payout_ratio`; a loss (including an
/// unchanged close) returns nothing.
#[derive(Debug)]
pub struct PaperAccount {
    market: Arc<PaperMarket>,
    account_type: AccountType,
    balance: RwLock<f64>,
    payout_ratio: f64,
    trades: RwLock<HashMap<String, OpenTrade>>,
    connected: AtomicBool,
}

impl PaperAccount {
    pub fn new(
        market: Arc<PaperMarket>,
        account_type: AccountType,
        initial_balance: f64,
        payout_ratio: f64,
    ) -> Self {
        info!(
            balance = initial_balance,
            payout_ratio,
            account = %account_type,
            "PaperAccount initialized"
        );
        Self {
            market,
            account_type,
            balance: RwLock::new(initial_balance),
            payout_ratio,
            trades: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(true),
        }
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    /// Drop the simulated connection; the next `reconnect` restores it.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub async fn open_trades(&self) -> usize {
        self.trades
            .read()
            .await
            .values()
            .filter(|t| t.payout.is_none())
            .count()
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Connection("paper account disconnected".into()))
        }
    }
}

#[async_trait]
impl CandleSource for PaperAccount {
    async fn candles(
        &self,
        instrument: &str,
        timeframe_minutes: u32,
        count: usize,
    ) -> Result<Vec<Candle>> {
        self.ensure_connected()?;
        self.market.candles(instrument, timeframe_minutes, count).await
    }

    async fn spread(&self, instrument: &str) -> Option<f64> {
        self.market.spread(instrument).await
    }
}

#[async_trait]
impl TradeExecutor for PaperAccount {
    async fn place_trade(
        &self,
        amount: f64,
        instrument: &str,
        direction: Direction,
        timeframe_minutes: u32,
    ) -> Result<TradePlacement> {
        self.ensure_connected()?;
        let Some(entry) = self.market.latest_close(instrument).await else {
            return Err(Error::Broker(format!("No price available for {instrument}")));
        };

        let mut balance = self.balance.write().await;
        if !(amount > 0.0) || amount > *balance {
            debug!(%instrument, amount, balance = *balance, "Paper trade rejected");
            return Ok(TradePlacement {
                accepted: false,
                trade_id: None,
            });
        }
        *balance -= amount;
        drop(balance);

        let trade_id = uuid::Uuid::new_v4().to_string();
        self.trades.write().await.insert(
            trade_id.clone(),
            OpenTrade {
                instrument: instrument.to_string(),
                direction,
                amount,
                entry,
                payout: None,
            },
        );
        debug!(
            %instrument,
            %direction,
            amount,
            entry,
            timeframe = timeframe_minutes,
            trade_id = %trade_id,
            "Paper trade opened"
        );
        Ok(TradePlacement {
            accepted: true,
            trade_id: Some(trade_id),
        })
    }

    async fn check_outcome(&self, trade_id: &str) -> Result<f64> {
        self.ensure_connected()?;
        let mut trades = self.trades.write().await;
        let trade = trades
            .get_mut(trade_id)
            .ok_or_else(|| Error::Broker(format!("Unknown trade {trade_id}")))?;
        if let Some(payout) = trade.payout {
            return Ok(payout);
        }

        let exit = self
            .market
            .latest_close(&trade.instrument)
            .await
            .ok_or_else(|| Error::Broker(format!("No price for {}", trade.instrument)))?;
        let won = match trade.direction {
            Direction::Call => exit > trade.entry,
            Direction::Put => exit < trade.entry,
        };
        let payout = if won {
            trade.amount * self.payout_ratio
        } else {
            -trade.amount
        };
        if won {
            *self.balance.write().await += trade.amount + payout;
        }
        trade.payout = Some(payout);
        debug!(trade_id, entry = trade.entry, exit, payout, "Paper trade settled");
        Ok(payout)
    }

    async fn balance(&self) -> Result<f64> {
        self.ensure_connected()?;
        Ok(*self.balance.read().await)
    }

    async fn currency(&self) -> Result<String> {
        self.ensure_connected()?;
        Ok("USD".to_string())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn reconnect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        info!(account = %self.account_type, "Paper account reconnected");
        Ok(())
    }
}
