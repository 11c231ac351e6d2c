use proptest::prelude::*;
use common::TradeSessionStats;
use risk::{SessionLimits, StopReason};

proptest! {
    /// Limit checks on randomized session statistics must never panic, and
    /// a session past a count limit is always stopped.
    #[test]
    fn limits_hold_on_random_stats(
        total_trades in 0u32..1000,
        consecutive_losses in 0u32..50,
        profit in -1_000_000.0f64..1_000_000.0f64,
        max_trades in 1u32..500,
        max_consecutive_losses in 1u32..20,
    ) {
        let limits = SessionLimits {
            stake: 1.0,
            max_consecutive_losses,
            max_trades,
            stop_loss: Some(500.0),
            take_profit: Some(500.0),
        };
        let stats = TradeSessionStats {
            total_trades,
            consecutive_losses,
            profit,
            ..TradeSessionStats::started()
        };
        let reason = limits.check(&stats);
        if consecutive_losses >= max_consecutive_losses {
            prop_assert_eq!(reason, Some(StopReason::ConsecutiveLosses(consecutive_losses)));
        } else if total_trades >= max_trades {
            prop_assert_eq!(reason, Some(StopReason::MaxTrades(total_trades)));
        } else if profit.abs() < 500.0 {
            prop_assert_eq!(reason, None);
        }
    }

    /// Replaying random outcomes never lets the streak exceed the limit
    /// unnoticed.
    #[test]
    fn streak_limit_trips_before_extra_trade(outcomes in prop::collection::vec(any::<bool>(), 0..200)) {
        let limits = SessionLimits {
            stake: 5.0,
            max_consecutive_losses: 4,
            max_trades: 100,
            stop_loss: None,
            take_profit: None,
        };
        let mut stats = TradeSessionStats::started();
        for won in outcomes {
            if limits.check(&stats).is_some() {
                break;
            }
            stats.total_trades += 1;
            stats.record_outcome(if won { 4.0 } else { 0.0 }, 5.0);
        }
        prop_assert!(stats.consecutive_losses <= 4);
        prop_assert!(stats.total_trades <= 100);
    }
}
