//! Price token extraction from raw OCR text
//!
//! Chart screenshots OCR into a soup of axis labels, indicator values and
//! noise. We pull out everything shaped like a price - 3 to 5 integer
//! digits, a decimal point, 1 to 4 fractional digits - and defer any
//! filtering to the signal engine. False positives are accepted by design.

use super::observation::TimeframeObservation;

/// Scan `text` for price-shaped tokens, in order of appearance.
///
/// Matching is greedy and non-overlapping, left to right: a run of more than
/// five integer digits contributes its last five (`"123456.78"` yields
/// `"23456.78"`), fraction digits beyond four are left unconsumed, and the
/// scan resumes after each match. Never fails; empty text gives an empty
/// token list.
pub fn extract_prices(text: &str) -> TimeframeObservation {
    let bytes = text.as_bytes();
    let mut numbers = Vec::new();
    // Start of the region no previous match has consumed.
    let mut cursor = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] == b'.' {
            // Consecutive digits immediately before the dot, capped at 5 and
            // bounded by what earlier matches already consumed.
            let mut start = i;
            while start > cursor && i - start < 5 && bytes[start - 1].is_ascii_digit() {
                start -= 1;
            }
            let int_len = i - start;

            // Consecutive digits after the dot, capped at 4.
            let mut end = i + 1;
            while end < bytes.len() && end - (i + 1) < 4 && bytes[end].is_ascii_digit() {
                end += 1;
            }
            let frac_len = end - (i + 1);

            if int_len >= 3 && frac_len >= 1 {
                numbers.push(text[start..end].to_string());
                cursor = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }

    TimeframeObservation::new(numbers, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        extract_prices(text).numbers
    }

    #[test]
    fn test_empty_text() {
        let obs = extract_prices("");
        assert!(obs.numbers.is_empty());
        assert_eq!(obs.raw, "");
    }

    #[test]
    fn test_no_price_shaped_tokens() {
        assert!(tokens("XAUUSD buy zone, strong support").is_empty());
        assert!(tokens("12.5 and 99.99 are too short").is_empty());
    }

    #[test]
    fn test_order_preserved() {
        assert_eq!(
            tokens("H 2014.35 L 2008.1 C 2011.20"),
            vec!["2014.35", "2008.1", "2011.20"]
        );
    }

    #[test]
    fn test_digit_count_boundaries() {
        // 3-5 integer digits, 1-4 fraction digits
        assert_eq!(tokens("123.4"), vec!["123.4"]);
        assert_eq!(tokens("12345.6789"), vec!["12345.6789"]);
        assert!(tokens("12.3456").is_empty());
        assert!(tokens("123.").is_empty());
    }

    #[test]
    fn test_long_integer_run_matches_suffix() {
        assert_eq!(tokens("123456.78"), vec!["23456.78"]);
    }

    #[test]
    fn test_extra_fraction_digits_truncated() {
        assert_eq!(tokens("123.456789"), vec!["123.4567"]);
    }

    #[test]
    fn test_matches_do_not_overlap() {
        // Once "123.4567" is consumed, the following ".890" has no integer
        // digits left to claim.
        assert_eq!(tokens("123.4567.890"), vec!["123.4567"]);
    }

    #[test]
    fn test_embedded_in_ocr_noise() {
        assert_eq!(
            tokens("1D|O2013.9 Vol 1.2M\nRSI 54.3 price=2016.05"),
            vec!["2013.9", "2016.05"]
        );
    }

    #[test]
    fn test_raw_text_kept_for_audit() {
        let obs = extract_prices("close 2011.20");
        assert_eq!(obs.raw, "close 2011.20");
    }
}
