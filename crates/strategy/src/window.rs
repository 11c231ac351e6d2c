use serde::{Deserialize, Serialize};

use common::Candle;

/// How the newest element of a candle window relates to the market clock.
///
/// With `Forming` (the live feed default) the last element is still open and
/// is never used as a trigger: the confirm candle is the second to last.
/// With `Closed` every element is final and the confirm candle is the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindowAlignment {
    #[default]
    Forming,
    Closed,
}

impl WindowAlignment {
    fn unusable_tail(self) -> usize {
        match self {
            WindowAlignment::Forming => 1,
            WindowAlignment::Closed => 0,
        }
    }
}

/// A candle window with its confirm index resolved.
///
/// Strategies index backward from the confirm candle (`back(0)`), the
/// setup candle is `back(1)`.
#[derive(Debug, Clone, Copy)]
pub struct CandleWindow<'a> {
    candles: &'a [Candle],
    confirm: usize,
}

impl<'a> CandleWindow<'a> {
    /// `None` when the window holds no closed candle.
    pub fn new(candles: &'a [Candle], alignment: WindowAlignment) -> Option<Self> {
        let closed = candles.len().checked_sub(alignment.unusable_tail())?;
        if closed == 0 {
            return None;
        }
        Some(Self {
            candles,
            confirm: closed - 1,
        })
    }

    pub fn raw_len(&self) -> usize {
        self.candles.len()
    }

    pub fn confirm_index(&self) -> usize {
        self.confirm
    }

    pub fn confirm(&self) -> &'a Candle {
        &self.candles[self.confirm]
    }

    pub fn setup(&self) -> Option<&'a Candle> {
        self.back(1)
    }

    /// The candle `k` steps before the confirm candle.
    pub fn back(&self, k: usize) -> Option<&'a Candle> {
        self.confirm.checked_sub(k).map(|i| &self.candles[i])
    }

    /// Closed candles only, oldest first, ending at the confirm candle.
    pub fn closed(&self) -> &'a [Candle] {
        &self.candles[..=self.confirm]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.closed().iter().map(|c| c.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle::new(i as f64, i as f64 + 1.0, i as f64 - 1.0, i as f64, i as i64))
            .collect()
    }

    #[test]
    fn forming_alignment_skips_last_candle() {
        let candles = series(10);
        let w = CandleWindow::new(&candles, WindowAlignment::Forming).unwrap();
        assert_eq!(w.confirm_index(), 8);
        assert_eq!(w.confirm().timestamp, 8);
        assert_eq!(w.setup().unwrap().timestamp, 7);
        assert_eq!(w.closed().len(), 9);
    }

    #[test]
    fn closed_alignment_uses_last_candle() {
        let candles = series(10);
        let w = CandleWindow::new(&candles, WindowAlignment::Closed).unwrap();
        assert_eq!(w.confirm().timestamp, 9);
        assert_eq!(w.back(3).unwrap().timestamp, 6);
        assert_eq!(w.closes().len(), 10);
    }

    #[test]
    fn empty_and_single_forming_windows() {
        assert!(CandleWindow::new(&[], WindowAlignment::Closed).is_none());
        let one = series(1);
        assert!(CandleWindow::new(&one, WindowAlignment::Forming).is_none());
        let w = CandleWindow::new(&one, WindowAlignment::Closed).unwrap();
        assert!(w.setup().is_none());
    }
}
