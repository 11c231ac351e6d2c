//! Simulated brokerage for paper trading.
//!
//! A [`PaperMarket`] replays recorded one-minute candles and is shared by
//! every session. Each user gets a [`PaperAccount`] from the
//! [`PaperConnector`] that settles binary options against the replayed
//! closes. No real orders are ever sent anywhere.

mod account;
mod connector;
mod market;

pub use account::PaperAccount;
pub use connector::PaperConnector;
pub use market::PaperMarket;
