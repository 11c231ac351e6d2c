use serde::{Deserialize, Serialize};
use tracing::debug;

use common::{AutotradeConfig, Error, Result, TradeSessionStats};

/// Hard ceiling on trades per autotrade session. Compiled-in, not
/// user-configurable.
pub const MAX_TRADES_CEILING: u32 = 500;

/// Stop conditions of one autotrade session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLimits {
    /// Stake per trade, in account currency.
    pub stake: f64,
    pub max_consecutive_losses: u32,
    pub max_trades: u32,
    /// Session loss (positive number) at which trading stops.
    pub stop_loss: Option<f64>,
    /// Session profit at which trading stops.
    pub take_profit: Option<f64>,
}

/// Why a session stopped trading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopReason {
    ConsecutiveLosses(u32),
    MaxTrades(u32),
    StopLoss(f64),
    TakeProfit(f64),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::ConsecutiveLosses(n) => write!(f, "{n} consecutive losses"),
            StopReason::MaxTrades(n) => write!(f, "reached {n} trades"),
            StopReason::StopLoss(p) => write!(f, "stop loss hit at {p:.2}"),
            StopReason::TakeProfit(p) => write!(f, "take profit hit at {p:.2}"),
        }
    }
}

impl SessionLimits {
    /// Validate and extract the limits of a session config.
    pub fn from_config(cfg: &AutotradeConfig) -> Result<Self> {
        let limits = Self {
            stake: cfg.amount,
            max_consecutive_losses: cfg.max_consecutive_losses,
            max_trades: cfg.max_trades,
            stop_loss: cfg.stop_loss,
            take_profit: cfg.take_profit,
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.stake.is_finite() && self.stake > 0.0) {
            return Err(Error::Config(format!("stake must be positive, got {}", self.stake)));
        }
        if self.max_consecutive_losses == 0 {
            return Err(Error::Config("max_consecutive_losses must be >= 1".into()));
        }
        if self.max_trades == 0 || self.max_trades > MAX_TRADES_CEILING {
            return Err(Error::Config(format!(
                "max_trades must be in 1..={MAX_TRADES_CEILING}, got {}",
                self.max_trades
            )));
        }
        for (key, value) in [("stop_loss", self.stop_loss), ("take_profit", self.take_profit)] {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(Error::Config(format!("{key} must be positive, got {v}")));
                }
            }
        }
        Ok(())
    }

    /// First tripped stop condition, checked before every scan.
    pub fn check(&self, stats: &TradeSessionStats) -> Option<StopReason> {
        let reason = if stats.consecutive_losses >= self.max_consecutive_losses {
            Some(StopReason::ConsecutiveLosses(stats.consecutive_losses))
        } else if stats.total_trades >= self.max_trades {
            Some(StopReason::MaxTrades(stats.total_trades))
        } else if self.stop_loss.is_some_and(|sl| stats.profit <= -sl) {
            Some(StopReason::StopLoss(stats.profit))
        } else if self.take_profit.is_some_and(|tp| stats.profit >= tp) {
            Some(StopReason::TakeProfit(stats.profit))
        } else {
            None
        };
        if let Some(r) = &reason {
            debug!(reason = %r, "Session limit reached");
        }
        reason
    }
}
