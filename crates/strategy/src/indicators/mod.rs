pub mod atr;
pub mod bollinger;
pub mod candle;
pub mod ma;
pub mod rsi;
pub mod zones;

pub use atr::{atr, atr_series, has_volatility, true_range};
pub use bollinger::{bollinger, bollinger_series, BollingerBands};
pub use candle::{features, CandleFeatures};
pub use ma::{ema, ema_series, sma};
pub use rsi::{rsi, rsi_series, NEUTRAL_RSI};
pub use zones::{cluster_levels, identify_zones, Zones};
