use std::fmt;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// For EUR/USD, 1 unit = 100 cents, so €50.00 = 5000 cents.
pub type Cents = i64;

/// Interest rates are represented as integer basis points: 10% = 1000 bps.
/// Keeps the flat-interest product in integer arithmetic.
pub type RateBps = i64;

/// Format cents as a human-readable currency string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Format basis points as a percentage string.
/// Example: 1000 -> "10.00%", 1050 -> "10.50%"
pub fn format_rate_bps(bps: RateBps) -> String {
    format!("{}%", format_cents(bps))
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseMoneyError> {
    parse_scaled(input)
}

/// Parse a percentage string into basis points.
/// Example: "10" -> 1000, "10.5" -> 1050, "0.25" -> 25
pub fn parse_rate_bps(input: &str) -> Result<RateBps, ParseMoneyError> {
    parse_scaled(input.trim().trim_end_matches('%'))
}

/// Parse a decimal string with up to two fractional digits into hundredths.
fn parse_scaled(input: &str) -> Result<i64, ParseMoneyError> {
    let input = input.trim();
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-');

    let parts: Vec<&str> = input.split('.').collect();
    match parts.len() {
        1 => {
            // No decimal point, treat as whole units
            let units: i64 = parts[0]
                .parse()
                .map_err(|_| ParseMoneyError::InvalidFormat)?;
            let hundredths = units * 100;
            Ok(if negative { -hundredths } else { hundredths })
        }
        2 => {
            let units: i64 = if parts[0].is_empty() {
                0
            } else {
                parts[0]
                    .parse()
                    .map_err(|_| ParseMoneyError::InvalidFormat)?
            };

            // Handle decimal part - pad or truncate to 2 digits
            let decimal_str = parts[1];
            let decimal: i64 = match decimal_str.len() {
                0 => 0,
                1 => {
                    // Single digit like "5" means 50 hundredths
                    decimal_str
                        .parse::<i64>()
                        .map_err(|_| ParseMoneyError::InvalidFormat)?
                        * 10
                }
                2 => decimal_str
                    .parse()
                    .map_err(|_| ParseMoneyError::InvalidFormat)?,
                _ => {
                    // More than 2 decimal places - truncate
                    decimal_str[..2]
                        .parse()
                        .map_err(|_| ParseMoneyError::InvalidFormat)?
                }
            };

            let hundredths = units * 100 + decimal;
            Ok(if negative { -hundredths } else { hundredths })
        }
        _ => Err(ParseMoneyError::InvalidFormat),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseMoneyError {
    InvalidFormat,
}

impl fmt::Display for ParseMoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMoneyError::InvalidFormat => write!(f, "invalid decimal format"),
        }
    }
}

impl std::error::Error for ParseMoneyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(100), "1.00");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(-1), "-0.01");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("50.00"), Ok(5000));
        assert_eq!(parse_cents("50"), Ok(5000));
        assert_eq!(parse_cents("12.34"), Ok(1234));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents("0.01"), Ok(1));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("-50.00"), Ok(-5000));
        assert_eq!(parse_cents("100.999"), Ok(10099)); // Truncates
    }

    #[test]
    fn test_parse_cents_invalid() {
        assert!(parse_cents("abc").is_err());
        assert!(parse_cents("12.34.56").is_err());
    }

    #[test]
    fn test_parse_rate_bps() {
        assert_eq!(parse_rate_bps("10"), Ok(1000));
        assert_eq!(parse_rate_bps("10.5"), Ok(1050));
        assert_eq!(parse_rate_bps("0.25"), Ok(25));
        assert_eq!(parse_rate_bps("10%"), Ok(1000));
        assert_eq!(parse_rate_bps("0"), Ok(0));
    }

    #[test]
    fn test_format_rate_bps() {
        assert_eq!(format_rate_bps(1000), "10.00%");
        assert_eq!(format_rate_bps(1050), "10.50%");
        assert_eq!(format_rate_bps(25), "0.25%");
    }
}
