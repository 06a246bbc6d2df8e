//! Human-readable rendering of measurement values.

use rust_decimal::Decimal;
use std::time::Duration;

/// Magnitude at which a value switches to the `k` prefix
const KILO: i64 = 1000;

/// Render a value with its unit suffix
///
/// Values with magnitude below 1000 are printed as-is. Anything larger is
/// divided by 1000 once and gets a `k` prefix; there is no further step.
///
/// ```
/// use rust_decimal::Decimal;
/// use usb_meter::output::units::with_unit;
///
/// assert_eq!(with_unit(Decimal::new(999, 0), "V"), "999 V");
/// assert_eq!(with_unit(Decimal::new(1000, 0), "V"), "1 kV");
/// ```
pub fn with_unit(value: Decimal, suffix: &str) -> String {
    let kilo = Decimal::from(KILO);

    if value.abs() < kilo {
        format!("{} {}", value.normalize(), suffix)
    } else {
        format!("{} k{}", (value / kilo).normalize(), suffix)
    }
}

/// Render an elapsed time as `H:MM:SS[.ffffff]`
///
/// Durations of a day or more get a leading `N day(s), `.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    let micros = elapsed.subsec_micros();

    let mut out = String::new();
    if days > 0 {
        let plural = if days == 1 { "" } else { "s" };
        out.push_str(&format!("{} day{}, ", days, plural));
    }
    out.push_str(&format!("{}:{:02}:{:02}", hours, minutes, seconds));
    if micros > 0 {
        out.push_str(&format!(".{:06}", micros));
    }

    out
}

/// Whole seconds of an elapsed time, rounded up
pub fn ceil_seconds(elapsed: Duration) -> u64 {
    elapsed.as_secs() + u64::from(elapsed.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_below_threshold_unscaled() {
        assert_eq!(with_unit(dec("999"), "V"), "999 V");
        assert_eq!(with_unit(dec("5.1230"), "A"), "5.123 A");
        assert_eq!(with_unit(dec("-999.9999"), "W"), "-999.9999 W");
        assert_eq!(with_unit(dec("0.0000"), "A·h"), "0 A·h");
    }

    #[test]
    fn test_threshold_scales_to_kilo() {
        assert_eq!(with_unit(dec("1000"), "V"), "1 kV");
        assert_eq!(with_unit(dec("1000.0000"), "W"), "1 kW");
        assert_eq!(with_unit(dec("-1500"), "W"), "-1.5 kW");
        assert_eq!(with_unit(dec("12345.6789"), "W·h"), "12.3456789 kW·h");
    }

    #[test]
    fn test_only_one_scaling_step() {
        assert_eq!(with_unit(dec("2500000"), "W"), "2500 kW");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "0:00:00");
        assert_eq!(format_elapsed(Duration::from_millis(83_450)), "0:01:23.450000");
        assert_eq!(format_elapsed(Duration::from_secs(3_600 * 5 + 7)), "5:00:07");
        assert_eq!(format_elapsed(Duration::from_secs(86_400 + 61)), "1 day, 0:01:01");
        assert_eq!(format_elapsed(Duration::from_secs(3 * 86_400)), "3 days, 0:00:00");
    }

    #[test]
    fn test_ceil_seconds() {
        assert_eq!(ceil_seconds(Duration::ZERO), 0);
        assert_eq!(ceil_seconds(Duration::from_secs(12)), 12);
        assert_eq!(ceil_seconds(Duration::from_millis(12_010)), 13);
        assert_eq!(ceil_seconds(Duration::from_millis(990)), 1);
    }
}
