//! # Helm Monitor
//!
//! The pure state machine over the server-sourced open-position set. It
//! performs no I/O: feed deliveries are applied to it, and the view layer
//! reads from it. Exactly one position per symbol, kept in a `BTreeMap` so
//! view order is deterministic and rows never jump between refreshes.

use core_types::{OpenPosition, PositionUpdate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Parses an ROI filter from raw operator input. Anything that is not a
/// number means "no filter", so a cleared or junk filter shows every row.
pub fn parse_roi_filter(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

#[derive(Debug, Clone, Default)]
pub struct PositionMonitor {
    positions: BTreeMap<String, OpenPosition>,
}

impl PositionMonitor {
    pub fn new() -> Self {
        Self {
            positions: BTreeMap::new(),
        }
    }

    /// Replaces the entire position set with a snapshot. Entries carrying a
    /// server-computed ROI keep it; the rest get theirs recomputed from
    /// entry and mark via the shared formula. Symbols absent from the
    /// snapshot are dropped.
    pub fn apply_snapshot(&mut self, updates: Vec<PositionUpdate>) {
        self.positions = updates
            .into_iter()
            .map(|update| (update.symbol.clone(), OpenPosition::from_update(update)))
            .collect();
    }

    /// Applies a single mark-price tick. An untracked symbol is a no-op
    /// returning `false`: a bare tick never creates a row. For a tracked
    /// symbol the mark and ROI are updated in place and no other row is
    /// touched.
    pub fn apply_mark_price(&mut self, symbol: &str, mark_price: Decimal) -> bool {
        match self.positions.get_mut(symbol) {
            Some(position) => {
                position.apply_mark(mark_price);
                true
            }
            None => false,
        }
    }

    /// The rows to display under an optional minimum-ROI filter, in stable
    /// symbol order. Never mutates the set.
    pub fn visible_positions(&self, min_roi: Option<Decimal>) -> Vec<&OpenPosition> {
        self.positions
            .values()
            .filter(|p| roi_matches(p, min_roi))
            .collect()
    }

    /// How many rows the filter keeps visible.
    pub fn match_count(&self, min_roi: Option<Decimal>) -> usize {
        self.positions
            .values()
            .filter(|p| roi_matches(p, min_roi))
            .count()
    }

    pub fn get(&self, symbol: &str) -> Option<&OpenPosition> {
        self.positions.get(symbol)
    }

    /// All tracked positions in stable symbol order.
    pub fn positions(&self) -> impl Iterator<Item = &OpenPosition> {
        self.positions.values()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

fn roi_matches(position: &OpenPosition, min_roi: Option<Decimal>) -> bool {
    min_roi.is_none_or(|min| position.roi_percent >= min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PositionSide;
    use rust_decimal_macros::dec;

    fn update(
        symbol: &str,
        side: PositionSide,
        entry: Decimal,
        mark: Option<Decimal>,
        leverage: u32,
        roi: Option<Decimal>,
    ) -> PositionUpdate {
        PositionUpdate {
            symbol: symbol.to_string(),
            side,
            entry_price: entry,
            leverage,
            mark_price: mark,
            roi,
        }
    }

    #[test]
    fn snapshot_computes_leveraged_roi_per_side() {
        let mut monitor = PositionMonitor::new();
        monitor.apply_snapshot(vec![
            update("BTCUSDT", PositionSide::Long, dec!(100), Some(dec!(110)), 10, None),
            update("ETHUSDT", PositionSide::Short, dec!(100), Some(dec!(110)), 10, None),
        ]);
        assert_eq!(monitor.get("BTCUSDT").unwrap().roi_percent, dec!(100));
        assert_eq!(monitor.get("ETHUSDT").unwrap().roi_percent, dec!(-100));
    }

    #[test]
    fn non_positive_entry_yields_zero_roi() {
        let mut monitor = PositionMonitor::new();
        monitor.apply_snapshot(vec![update(
            "BTCUSDT",
            PositionSide::Long,
            dec!(0),
            Some(dec!(110)),
            10,
            None,
        )]);
        assert_eq!(monitor.get("BTCUSDT").unwrap().roi_percent, Decimal::ZERO);
    }

    #[test]
    fn server_roi_wins_over_recompute() {
        let mut monitor = PositionMonitor::new();
        monitor.apply_snapshot(vec![update(
            "BTCUSDT",
            PositionSide::Long,
            dec!(100),
            Some(dec!(110)),
            10,
            Some(dec!(42)),
        )]);
        assert_eq!(monitor.get("BTCUSDT").unwrap().roi_percent, dec!(42));
    }

    #[test]
    fn tick_for_untracked_symbol_changes_nothing() {
        let mut monitor = PositionMonitor::new();
        monitor.apply_snapshot(vec![update(
            "BTCUSDT",
            PositionSide::Long,
            dec!(100),
            Some(dec!(100)),
            10,
            None,
        )]);
        assert!(!monitor.apply_mark_price("DOGEUSDT", dec!(1)));
        assert_eq!(monitor.len(), 1);
        assert!(monitor.get("DOGEUSDT").is_none());
    }

    #[test]
    fn tick_updates_only_its_own_row() {
        let mut monitor = PositionMonitor::new();
        monitor.apply_snapshot(vec![
            update("BTCUSDT", PositionSide::Long, dec!(100), Some(dec!(100)), 10, None),
            update("ETHUSDT", PositionSide::Long, dec!(200), Some(dec!(200)), 5, None),
        ]);
        assert!(monitor.apply_mark_price("BTCUSDT", dec!(105)));

        let btc = monitor.get("BTCUSDT").unwrap();
        assert_eq!(btc.mark_price, dec!(105));
        assert_eq!(btc.roi_percent, dec!(50));

        let eth = monitor.get("ETHUSDT").unwrap();
        assert_eq!(eth.mark_price, dec!(200));
        assert_eq!(eth.roi_percent, Decimal::ZERO);
    }

    #[test]
    fn snapshot_fully_replaces_the_set() {
        let mut monitor = PositionMonitor::new();
        monitor.apply_snapshot(vec![
            update("BTCUSDT", PositionSide::Long, dec!(100), None, 10, None),
            update("ETHUSDT", PositionSide::Long, dec!(200), None, 5, None),
        ]);
        monitor.apply_snapshot(vec![update(
            "ETHUSDT",
            PositionSide::Long,
            dec!(210),
            None,
            5,
            None,
        )]);
        assert_eq!(monitor.len(), 1);
        assert!(monitor.get("BTCUSDT").is_none());
        assert_eq!(monitor.get("ETHUSDT").unwrap().entry_price, dec!(210));
    }

    #[test]
    fn filter_keeps_rows_at_or_above_the_threshold() {
        let mut monitor = PositionMonitor::new();
        monitor.apply_snapshot(vec![
            update("BTCUSDT", PositionSide::Long, dec!(100), None, 1, Some(dec!(10))),
            update("ETHUSDT", PositionSide::Long, dec!(100), None, 1, Some(dec!(3))),
        ]);

        let visible = monitor.visible_positions(Some(dec!(5)));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].symbol, "BTCUSDT");
        assert_eq!(monitor.match_count(Some(dec!(5))), 1);

        assert_eq!(monitor.visible_positions(None).len(), 2);
        assert_eq!(monitor.match_count(None), 2);
    }

    #[test]
    fn junk_filter_input_means_no_filter() {
        assert_eq!(parse_roi_filter("5"), Some(dec!(5)));
        assert_eq!(parse_roi_filter("-2.5"), Some(dec!(-2.5)));
        assert_eq!(parse_roi_filter("abc"), None);
        assert_eq!(parse_roi_filter(""), None);
    }

    #[test]
    fn rows_come_back_in_stable_symbol_order() {
        let mut monitor = PositionMonitor::new();
        monitor.apply_snapshot(vec![
            update("SOLUSDT", PositionSide::Long, dec!(1), None, 1, None),
            update("BTCUSDT", PositionSide::Long, dec!(1), None, 1, None),
            update("ETHUSDT", PositionSide::Long, dec!(1), None, 1, None),
        ]);
        let symbols: Vec<&str> = monitor.positions().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]);
    }
}
