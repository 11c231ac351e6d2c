//! Market-type detection by instrument naming.

/// Venue an instrument trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketKind {
    /// Synthetic, continuously tradable instrument (name contains "OTC").
    Otc,
    /// Real-market-hours instrument.
    Real,
}

impl MarketKind {
    pub fn of(instrument: &str) -> Self {
        if instrument.to_ascii_uppercase().contains("OTC") {
            MarketKind::Otc
        } else {
            MarketKind::Real
        }
    }
}

pub fn is_otc(instrument: &str) -> bool {
    MarketKind::of(instrument) == MarketKind::Otc
}

/// Which instruments a strategy accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketClass {
    OtcOnly,
    RealOnly,
    Any,
}

impl MarketClass {
    pub fn admits(self, kind: MarketKind) -> bool {
        match self {
            MarketClass::OtcOnly => kind == MarketKind::Otc,
            MarketClass::RealOnly => kind == MarketKind::Real,
            MarketClass::Any => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_name() {
        assert!(is_otc("EURUSD-OTC"));
        assert!(is_otc("gbpusd-otc"));
        assert!(!is_otc("EURUSD"));
        assert_eq!(MarketKind::of("USDJPY"), MarketKind::Real);
    }

    #[test]
    fn class_admission() {
        assert!(MarketClass::OtcOnly.admits(MarketKind::Otc));
        assert!(!MarketClass::OtcOnly.admits(MarketKind::Real));
        assert!(MarketClass::RealOnly.admits(MarketKind::Real));
        assert!(MarketClass::Any.admits(MarketKind::Otc));
    }
}
