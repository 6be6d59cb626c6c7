use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_amount(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim().replace(',', ".").as_str())
        .map_err(|err| format!("failed to parse '{raw}' as an amount ({err})"))
}

/// Parses `CODE=VALUE`, e.g. `EUR=98.75`, into an upper-cased code and rate.
pub(crate) fn parse_rate(raw: &str) -> Result<(String, Decimal), String> {
    let (code, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=VALUE, got '{raw}'"))?;
    let code = code.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(format!("missing currency code in '{raw}'"));
    }
    let rate = parse_amount(value)?;
    if rate <= Decimal::ZERO {
        return Err(format!("rate for {code} must be positive"));
    }
    Ok((code, rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rates_parse_with_either_decimal_separator() {
        assert_eq!(parse_rate("eur=98.75"), Ok(("EUR".to_string(), dec!(98.75))));
        assert_eq!(parse_rate(" USD = 90,5 "), Ok(("USD".to_string(), dec!(90.5))));
    }

    #[test]
    fn malformed_rates_are_rejected() {
        assert!(parse_rate("EUR").is_err());
        assert!(parse_rate("=100").is_err());
        assert!(parse_rate("EUR=abc").is_err());
        assert!(parse_rate("EUR=0").is_err());
    }

    #[test]
    fn dates_use_iso_format() {
        assert_eq!(
            parse_date("2025-03-01"),
            Ok(NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date"))
        );
        assert!(parse_date("01.03.2025").is_err());
    }
}
