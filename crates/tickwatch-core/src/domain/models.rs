use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Symbol, TradingDate, ValidationError};

/// Inclusive bounds accepted for a price-history range, in days.
pub const MIN_RANGE_DAYS: u32 = 1;
pub const MAX_RANGE_DAYS: u32 = 1000;
pub const DEFAULT_RANGE_DAYS: u32 = 360;

pub fn validate_range_days(days: u32) -> Result<u32, ValidationError> {
    if (MIN_RANGE_DAYS..=MAX_RANGE_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ValidationError::InvalidRange {
            days,
            min: MIN_RANGE_DAYS,
            max: MAX_RANGE_DAYS,
        })
    }
}

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: TradingDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// Bar open as unix seconds.
    pub time: i64,
}

impl DailyBar {
    pub fn new(
        date: TradingDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
        time: i64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            time,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMetadata {
    pub symbol: Symbol,
    pub last_refreshed: String,
    pub time_zone: String,
}

/// Provider-agnostic price history for one symbol, newest bar first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStockRecord {
    pub metadata: StockMetadata,
    pub series: Vec<DailyBar>,
}

impl NormalizedStockRecord {
    /// Builds a record, sorting the series descending by date.
    ///
    /// An empty series is representable; callers decide whether that counts as
    /// a successful load.
    pub fn new(metadata: StockMetadata, mut series: Vec<DailyBar>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::with_capacity(series.len());
        for bar in &series {
            if !seen.insert(bar.date) {
                return Err(ValidationError::DuplicateBarDate {
                    date: bar.date.to_string(),
                });
            }
        }

        series.sort_by(|left, right| right.date.cmp(&left.date));
        Ok(Self { metadata, series })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.metadata.symbol
    }

    pub fn latest(&self) -> Option<&DailyBar> {
        self.series.first()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Transient symbol-search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub instrument_type: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub currency: String,
}

impl SearchResult {
    /// Results without both a symbol and a name are not shown.
    pub fn is_complete(&self) -> bool {
        !self.symbol.trim().is_empty() && !self.name.trim().is_empty()
    }
}

pub(crate) fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

pub(crate) fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_non_negative(field, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> DailyBar {
        let date = TradingDate::parse(date).expect("date");
        DailyBar::new(date, close, close + 1.0, close - 1.0, close, 1_000, 0).expect("bar")
    }

    fn metadata() -> StockMetadata {
        StockMetadata {
            symbol: Symbol::parse("AAPL").expect("symbol"),
            last_refreshed: String::from("2024-01-03"),
            time_zone: String::from("US/Eastern"),
        }
    }

    #[test]
    fn series_is_sorted_newest_first() {
        let record = NormalizedStockRecord::new(
            metadata(),
            vec![bar("2024-01-02", 10.0), bar("2024-01-03", 11.0), bar("2023-12-29", 9.0)],
        )
        .expect("record");

        let dates: Vec<String> = record.series.iter().map(|b| b.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-03", "2024-01-02", "2023-12-29"]);
        assert_eq!(record.latest().map(|b| b.close), Some(11.0));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let err = NormalizedStockRecord::new(
            metadata(),
            vec![bar("2024-01-02", 10.0), bar("2024-01-02", 10.5)],
        )
        .expect_err("must fail");
        assert_eq!(
            err,
            ValidationError::DuplicateBarDate {
                date: String::from("2024-01-02")
            }
        );
    }

    #[test]
    fn bars_reject_negative_and_non_finite_prices() {
        let date = TradingDate::parse("2024-01-02").expect("date");
        assert_eq!(
            DailyBar::new(date, -1.0, 2.0, 1.0, 1.5, 0, 0),
            Err(ValidationError::NegativeValue { field: "open" })
        );
        assert_eq!(
            DailyBar::new(date, 1.0, f64::NAN, 1.0, 1.5, 0, 0),
            Err(ValidationError::NonFiniteValue { field: "high" })
        );
        assert_eq!(
            DailyBar::new(date, 1.0, 1.0, 2.0, 1.5, 0, 0),
            Err(ValidationError::InvalidBarRange)
        );
    }

    #[test]
    fn range_bounds() {
        assert_eq!(validate_range_days(360), Ok(360));
        assert!(validate_range_days(0).is_err());
        assert!(validate_range_days(1001).is_err());
    }

    #[test]
    fn search_results_need_symbol_and_name() {
        let partial: SearchResult =
            serde_json::from_str(r#"{"symbol":"AAPL","type":"Equity"}"#).expect("json");
        assert!(!partial.is_complete());
        assert_eq!(partial.instrument_type, "Equity");
    }
}
