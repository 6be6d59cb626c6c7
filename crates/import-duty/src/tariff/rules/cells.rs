use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

const PLACEHOLDERS: &[&str] = &["", "—", "–", "-", "нет", "n/a"];

/// Inclusive numeric range; a missing bound is open on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RangeBounds {
    pub from: Option<u32>,
    pub to: Option<u32>,
}

impl RangeBounds {
    pub const UNBOUNDED: Self = Self {
        from: None,
        to: None,
    };

    pub const fn new(from: Option<u32>, to: Option<u32>) -> Self {
        Self { from, to }
    }

    pub const fn between(from: u32, to: u32) -> Self {
        Self::new(Some(from), Some(to))
    }

    pub const fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// An unbounded range matches anything, including an unknown value;
    /// a bounded range never matches an unknown value.
    pub fn contains(&self, value: Option<u32>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(value) = value else {
            return false;
        };

        self.from.map_or(true, |low| value >= low) && self.to.map_or(true, |high| value <= high)
    }

    pub fn intersects(&self, other: &Self) -> bool {
        let low = self.from.unwrap_or(0).max(other.from.unwrap_or(0));
        let high = self
            .to
            .unwrap_or(u32::MAX)
            .min(other.to.unwrap_or(u32::MAX));
        low <= high
    }
}

/// Outcome of reading one numeric cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cell<T> {
    Empty,
    Value(T),
    Malformed,
}

impl<T> Cell<T> {
    pub(crate) fn into_option(self) -> Option<T> {
        match self {
            Cell::Value(value) => Some(value),
            Cell::Empty | Cell::Malformed => None,
        }
    }
}

fn is_placeholder(raw: &str) -> bool {
    let lowered = raw.trim().to_lowercase();
    PLACEHOLDERS.contains(&lowered.as_str())
}

fn compact(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .replace(['—', '–'], "-")
        .replace("..", "-")
        .replace(',', ".")
}

fn parse_bound(raw: &str) -> Option<u32> {
    if let Ok(value) = raw.parse::<u32>() {
        return Some(value);
    }

    // Spreadsheet exports sometimes write "1800.0"; the fraction is dropped.
    let value = Decimal::from_str(raw).ok()?;
    if value.is_sign_negative() {
        return None;
    }
    value.trunc().to_u32()
}

/// Parses an engine range cell: "1801-2300", "2300", "3001+", "3001-" or a
/// placeholder such as "—" that leaves the range unbounded.
pub(crate) fn parse_range(raw: &str) -> Cell<RangeBounds> {
    if is_placeholder(raw) {
        return Cell::Empty;
    }

    let compacted = compact(raw);

    if let Some(low) = compacted.strip_suffix('+') {
        return match parse_bound(low) {
            Some(low) => Cell::Value(RangeBounds::new(Some(low), None)),
            None => Cell::Malformed,
        };
    }

    if let Some((low, high)) = compacted.split_once('-') {
        let low = if low.is_empty() {
            None
        } else {
            match parse_bound(low) {
                Some(value) => Some(value),
                None => return Cell::Malformed,
            }
        };
        let high = if high.is_empty() {
            None
        } else {
            match parse_bound(high) {
                Some(value) => Some(value),
                None => return Cell::Malformed,
            }
        };
        return match (low, high) {
            (Some(low), Some(high)) if low > high => Cell::Malformed,
            (low, high) => Cell::Value(RangeBounds::new(low, high)),
        };
    }

    match parse_bound(&compacted) {
        Some(value) => Cell::Value(RangeBounds::between(value, value)),
        None => Cell::Malformed,
    }
}

/// Parses a rate cell such as "20", "0,44" or "20%".
pub(crate) fn parse_decimal(raw: &str) -> Cell<Decimal> {
    if is_placeholder(raw) {
        return Cell::Empty;
    }

    let compacted = compact(raw);
    let number = compacted.strip_suffix('%').unwrap_or(&compacted);
    match Decimal::from_str(number) {
        Ok(value) => Cell::Value(value),
        Err(_) => Cell::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn range_cells_accept_spans_singles_and_open_ends() {
        assert_eq!(
            parse_range("1801-2300"),
            Cell::Value(RangeBounds::between(1801, 2300))
        );
        assert_eq!(
            parse_range("1 801 – 2 300"),
            Cell::Value(RangeBounds::between(1801, 2300))
        );
        assert_eq!(
            parse_range("1801..2300"),
            Cell::Value(RangeBounds::between(1801, 2300))
        );
        assert_eq!(
            parse_range("2300"),
            Cell::Value(RangeBounds::between(2300, 2300))
        );
        assert_eq!(
            parse_range("3001+"),
            Cell::Value(RangeBounds::new(Some(3001), None))
        );
        assert_eq!(
            parse_range("3001-"),
            Cell::Value(RangeBounds::new(Some(3001), None))
        );
        assert_eq!(
            parse_range("1800.0"),
            Cell::Value(RangeBounds::between(1800, 1800))
        );
    }

    #[test]
    fn placeholders_leave_the_range_unconstrained() {
        for raw in ["", "  ", "—", "-", "нет", "N/A"] {
            assert_eq!(parse_range(raw), Cell::Empty, "placeholder {raw:?}");
        }
    }

    #[test]
    fn garbage_is_reported_as_malformed() {
        assert_eq!(parse_range("abc"), Cell::Malformed);
        assert_eq!(parse_range("10-x"), Cell::Malformed);
        assert_eq!(parse_range("3000-1000"), Cell::Malformed);
        assert_eq!(parse_decimal("twenty"), Cell::Malformed);
    }

    #[test]
    fn decimal_cells_accept_commas_and_percent_signs() {
        assert_eq!(parse_decimal("0,44"), Cell::Value(dec!(0.44)));
        assert_eq!(parse_decimal("20%"), Cell::Value(dec!(20)));
        assert_eq!(parse_decimal(" 1 740 "), Cell::Value(dec!(1740)));
        assert_eq!(parse_decimal("—"), Cell::Empty);
    }

    #[test]
    fn ranges_match_inclusively() {
        let range = RangeBounds::between(1801, 2300);
        assert!(range.contains(Some(1801)));
        assert!(range.contains(Some(2300)));
        assert!(!range.contains(Some(2301)));
        assert!(!range.contains(None));
        assert!(RangeBounds::UNBOUNDED.contains(None));
        assert!(RangeBounds::new(Some(3001), None).contains(Some(9000)));
    }

    #[test]
    fn intersection_respects_open_bounds() {
        let low = RangeBounds::between(1000, 2000);
        assert!(low.intersects(&RangeBounds::between(2000, 3000)));
        assert!(!low.intersects(&RangeBounds::between(2001, 3000)));
        assert!(low.intersects(&RangeBounds::UNBOUNDED));
        assert!(RangeBounds::new(Some(3001), None).intersects(&RangeBounds::new(None, Some(3001))));
    }
}
