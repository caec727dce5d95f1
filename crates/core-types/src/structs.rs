use crate::enums::PositionSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Gateway account identifier. The gateway hands these out as plain integers.
pub type AccountId = i64;

/// The price attached to a composer leg. A leg starts `Pending` and becomes
/// `Quoted` if (and only if) the one-shot price lookup succeeds. On the wire
/// a pending price is `null`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegPrice {
    Quoted(Decimal),
    #[default]
    Pending,
}

impl LegPrice {
    pub fn is_pending(&self) -> bool {
        matches!(self, LegPrice::Pending)
    }

    pub fn quoted(&self) -> Option<Decimal> {
        match self {
            LegPrice::Quoted(p) => Some(*p),
            LegPrice::Pending => None,
        }
    }
}

/// A not-yet-submitted trade leg held by the composer. One per selected
/// symbol; sizing fields are per-leg, side and margin mode are chosen once
/// for the whole submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLeg {
    pub symbol: String,
    pub leverage: u32,
    pub margin: Decimal,
    #[serde(default)]
    pub price: LegPrice,
}

impl CandidateLeg {
    /// Margin divided by leverage, the capital the leg is expected to
    /// consume. `None` for a zero-leverage leg, which is excluded from
    /// aggregation rather than dividing by zero.
    pub fn estimated_cost(&self) -> Option<Decimal> {
        if self.leverage == 0 {
            return None;
        }
        Some(self.margin / Decimal::from(self.leverage))
    }
}

/// One element of the `coins` array in a trade submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionLeg {
    pub symbol: String,
    pub side: PositionSide,
    pub leverage: u32,
    pub margin: Decimal,
    pub margin_mode: crate::enums::MarginMode,
}

/// One element of the `trades` array in a batched close request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseRequestLeg {
    pub symbol: String,
    pub side: PositionSide,
}

/// A position entry as delivered by the feed, either inside a full snapshot
/// or reconstructed from a poll fetch. `mark_price` and `roi` are optional
/// because the push transport's snapshot frames omit them; when `roi` is
/// present it is the server's figure and taken as authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub symbol: String,
    pub side: PositionSide,
    pub entry_price: Decimal,
    pub leverage: u32,
    #[serde(default)]
    pub mark_price: Option<Decimal>,
    #[serde(default)]
    pub roi: Option<Decimal>,
}

/// An open position as tracked by the monitor. Exactly one per symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: String,
    pub side: PositionSide,
    pub entry_price: Decimal,
    pub leverage: u32,
    pub mark_price: Decimal,
    pub roi_percent: Decimal,
}

impl OpenPosition {
    /// Builds a tracked position from a feed entry. A server-provided ROI
    /// wins; otherwise the ROI is recomputed from entry and mark, or left at
    /// zero until the first tick when the entry carries no mark at all.
    pub fn from_update(update: PositionUpdate) -> Self {
        let roi = match (update.roi, update.mark_price) {
            (Some(server_roi), _) => server_roi,
            (None, Some(mark)) => {
                roi_percent(update.entry_price, mark, update.side, update.leverage)
            }
            (None, None) => Decimal::ZERO,
        };
        Self {
            symbol: update.symbol,
            side: update.side,
            entry_price: update.entry_price,
            leverage: update.leverage,
            mark_price: update.mark_price.unwrap_or(Decimal::ZERO),
            roi_percent: roi,
        }
    }

    /// Applies a single mark-price tick to this position in place.
    pub fn apply_mark(&mut self, mark_price: Decimal) {
        self.mark_price = mark_price;
        self.roi_percent = roi_percent(self.entry_price, mark_price, self.side, self.leverage);
    }
}

/// Leveraged ROI in percent: `((mark - entry) / entry) * leverage * 100`,
/// sign-inverted for shorts. An entry price of zero or less yields zero
/// rather than a division error; such rows exist transiently while the
/// gateway is still filling.
pub fn roi_percent(
    entry_price: Decimal,
    mark_price: Decimal,
    side: PositionSide,
    leverage: u32,
) -> Decimal {
    if entry_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let raw = (mark_price - entry_price) / entry_price;
    let leveraged = raw * Decimal::from(leverage) * Decimal::ONE_HUNDRED;
    match side {
        PositionSide::Long => leveraged,
        PositionSide::Short => -leveraged,
    }
}

/// A stored template as the listing endpoint describes it. `created_at` is
/// the unix timestamp (in seconds) the server assigned at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
}

/// The full settings snapshot a template stores: the composer's legs plus
/// the submission-wide defaults that go with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSettings {
    pub bot_name: String,
    pub side: PositionSide,
    pub margin_mode: crate::enums::MarginMode,
    pub coins: Vec<CandidateLeg>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::MarginMode;
    use rust_decimal_macros::dec;

    #[test]
    fn roi_is_leveraged_and_signed() {
        // +10% price move at 10x leverage.
        assert_eq!(
            roi_percent(dec!(100), dec!(110), PositionSide::Long, 10),
            dec!(100)
        );
        assert_eq!(
            roi_percent(dec!(100), dec!(110), PositionSide::Short, 10),
            dec!(-100)
        );
    }

    #[test]
    fn roi_guards_non_positive_entry() {
        assert_eq!(
            roi_percent(dec!(0), dec!(110), PositionSide::Long, 10),
            Decimal::ZERO
        );
        assert_eq!(
            roi_percent(dec!(-5), dec!(110), PositionSide::Short, 10),
            Decimal::ZERO
        );
    }

    #[test]
    fn estimated_cost_divides_margin_by_leverage() {
        let leg = CandidateLeg {
            symbol: "BTCUSDT".to_string(),
            leverage: 10,
            margin: dec!(100),
            price: LegPrice::Pending,
        };
        assert_eq!(leg.estimated_cost(), Some(dec!(10)));
    }

    #[test]
    fn zero_leverage_leg_has_no_cost() {
        let leg = CandidateLeg {
            symbol: "BTCUSDT".to_string(),
            leverage: 0,
            margin: dec!(100),
            price: LegPrice::Pending,
        };
        assert_eq!(leg.estimated_cost(), None);
    }

    #[test]
    fn from_update_prefers_server_roi() {
        let update = PositionUpdate {
            symbol: "ETHUSDT".to_string(),
            side: PositionSide::Long,
            entry_price: dec!(100),
            leverage: 10,
            mark_price: Some(dec!(110)),
            roi: Some(dec!(42.5)),
        };
        let pos = OpenPosition::from_update(update);
        assert_eq!(pos.roi_percent, dec!(42.5));
    }

    #[test]
    fn from_update_recomputes_when_server_roi_absent() {
        let update = PositionUpdate {
            symbol: "ETHUSDT".to_string(),
            side: PositionSide::Short,
            entry_price: dec!(200),
            leverage: 5,
            mark_price: Some(dec!(190)),
            roi: None,
        };
        let pos = OpenPosition::from_update(update);
        // -5% move, short side, 5x leverage.
        assert_eq!(pos.roi_percent, dec!(25));
    }

    #[test]
    fn from_update_without_mark_starts_at_zero_roi() {
        let update = PositionUpdate {
            symbol: "ETHUSDT".to_string(),
            side: PositionSide::Long,
            entry_price: dec!(200),
            leverage: 5,
            mark_price: None,
            roi: None,
        };
        let pos = OpenPosition::from_update(update);
        assert_eq!(pos.roi_percent, Decimal::ZERO);
        assert_eq!(pos.mark_price, Decimal::ZERO);
    }

    #[test]
    fn apply_mark_recomputes_in_place() {
        let mut pos = OpenPosition {
            symbol: "BTCUSDT".to_string(),
            side: PositionSide::Long,
            entry_price: dec!(100),
            leverage: 10,
            mark_price: dec!(100),
            roi_percent: Decimal::ZERO,
        };
        pos.apply_mark(dec!(105));
        assert_eq!(pos.mark_price, dec!(105));
        assert_eq!(pos.roi_percent, dec!(50));
    }

    #[test]
    fn pending_price_serializes_as_null() {
        let leg = CandidateLeg {
            symbol: "BTCUSDT".to_string(),
            leverage: 10,
            margin: dec!(100),
            price: LegPrice::Pending,
        };
        let json = serde_json::to_value(&leg).unwrap();
        assert!(json["price"].is_null());

        let parsed: CandidateLeg = serde_json::from_value(json).unwrap();
        assert!(parsed.price.is_pending());
    }

    #[test]
    fn template_settings_round_trip() {
        let settings = TemplateSettings {
            bot_name: "scalper".to_string(),
            side: PositionSide::Short,
            margin_mode: MarginMode::Cross,
            coins: vec![CandidateLeg {
                symbol: "SOLUSDT".to_string(),
                leverage: 20,
                margin: dec!(50),
                price: LegPrice::Quoted(dec!(145.2)),
            }],
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"CROSSED\""));
        let back: TemplateSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
