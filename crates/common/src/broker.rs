use std::sync::Arc;

use async_trait::async_trait;

use crate::{Candle, Credentials, Direction, Notification, Result, TradePlacement, TradeSessionStats};

/// Source of candle windows.
///
/// An empty or short answer is a normal outcome ("insufficient data") and
/// must not be reported as an error by implementors that can tell the
/// difference.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Up to `count` candles of `timeframe_minutes` granularity, oldest first.
    async fn candles(
        &self,
        instrument: &str,
        timeframe_minutes: u32,
        count: usize,
    ) -> Result<Vec<Candle>>;

    /// Current bid/ask spread in price units, when the venue quotes one.
    async fn spread(&self, _instrument: &str) -> Option<f64> {
        None
    }
}

/// Trade execution against a user's brokerage account.
///
/// Only the autotrade worker in `crates/engine` places trades.
#[async_trait]
pub trait TradeExecutor: Send + Sync {
    async fn place_trade(
        &self,
        amount: f64,
        instrument: &str,
        direction: Direction,
        timeframe_minutes: u32,
    ) -> Result<TradePlacement>;

    /// Signed payout of a settled trade: positive on a win.
    async fn check_outcome(&self, trade_id: &str) -> Result<f64>;

    async fn balance(&self) -> Result<f64>;

    async fn currency(&self) -> Result<String>;

    async fn is_connected(&self) -> bool {
        true
    }

    async fn reconnect(&self) -> Result<()> {
        Ok(())
    }
}

/// A per-user brokerage connection: candles plus execution.
pub trait Broker: CandleSource + TradeExecutor {}

impl<T: CandleSource + TradeExecutor> Broker for T {}

/// Opens a brokerage connection for a user.
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    async fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn Broker>>;
}

/// Push-notification dispatch. Best-effort from the core's point of view.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipients: &[String], notification: &Notification) -> Result<()>;
}

/// Periodic status persistence for autotrade sessions. Best-effort.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn save_status(&self, user: &str, status: &TradeSessionStats) -> Result<()>;
}
