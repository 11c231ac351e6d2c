use proptest::prelude::*;
use common::{Action, Candle};
use strategy::indicators::{atr, bollinger, rsi, rsi_series};
use strategy::{resample_to_n, StrategyProfile, StrategyRegistry, WindowAlignment};

fn arb_candle() -> impl Strategy<Value = Candle> {
    (0.5f64..2.0, 0.0f64..0.01, 0.0f64..0.01, -0.01f64..0.01).prop_map(|(open, up, down, delta)| {
        let close = open + delta;
        Candle::new(open, open.max(close) + up, open.min(close) - down, close, 0)
    })
}

fn arb_candles(max: usize) -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec(arb_candle(), 0..max).prop_map(|mut v| {
        for (i, c) in v.iter_mut().enumerate() {
            c.timestamp = 1_704_103_200 + i as i64 * 60;
        }
        v
    })
}

proptest! {
    /// RSI stays inside [0, 100] on arbitrary closes.
    #[test]
    fn rsi_is_bounded(closes in prop::collection::vec(0.0001f64..1_000_000.0, 0..300), period in 2usize..30) {
        for v in rsi_series(&closes, period) {
            prop_assert!((0.0..=100.0).contains(&v), "rsi {v}");
        }
    }

    /// Strictly rising closes push RSI to the top of the range.
    #[test]
    fn rising_closes_read_overbought(start in 1.0f64..100.0, step in 0.001f64..1.0, len in 15usize..120) {
        let closes: Vec<f64> = (0..len).map(|i| start + step * i as f64).collect();
        let v = rsi(&closes, 14);
        prop_assert!(v > 99.0 && v <= 100.0, "rsi {v}");
    }

    #[test]
    fn resample_count_and_bounds(candles in arb_candles(200), n in 1usize..16) {
        let out = resample_to_n(&candles, n);
        if n == 1 {
            prop_assert_eq!(&out, &candles);
        }
        prop_assert_eq!(out.len(), candles.len() / n);

        let skip = candles.len() % n;
        for (bar, chunk) in out.iter().zip(candles[skip..].chunks_exact(n)) {
            prop_assert!(chunk.iter().all(|c| bar.high >= c.high && bar.low <= c.low));
            prop_assert_eq!(bar.open, chunk[0].open);
            prop_assert_eq!(bar.close, chunk[chunk.len() - 1].close);
        }
    }

    #[test]
    fn atr_and_bands_never_panic(candles in arb_candles(120), period in 1usize..40) {
        let v = atr(&candles, period);
        prop_assert!(v.is_finite() && v >= 0.0);
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let b = bollinger(&closes, period, 2.0);
        prop_assert!(b.lower <= b.upper);
    }

    /// Every strategy on every market yields NEUTRAL/0 below 20 candles and a
    /// confidence in range otherwise.
    #[test]
    fn dispatch_is_total(candles in arb_candles(90)) {
        let registry = StrategyRegistry::builtin();
        let profile = StrategyProfile::default();
        let names: Vec<&str> = registry.names().collect();
        for name in names {
            for instrument in ["EURUSD-OTC", "EURUSD"] {
                let r = registry.dispatch(instrument, &candles, name, &profile, WindowAlignment::Forming, None);
                if candles.len() < 20 {
                    prop_assert_eq!(r.action, Action::Neutral);
                    prop_assert_eq!(r.confidence, 0.0);
                }
                let r = r.clamped();
                prop_assert!((0.0..=100.0).contains(&r.confidence));
            }
        }
    }
}
