//! Property-based tests for reference codes.

use proptest::prelude::*;

use super::code::{format_code, next_after, parse_code};

fn prefix() -> impl Strategy<Value = String> {
    "[A-Z]{2,8}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Parsing recovers every formatted component.
    #[test]
    fn prop_parse_inverts_format(
        prefix in prefix(),
        year in 1900i32..=9999,
        value in 1i64..10_000_000,
    ) {
        let code = format_code(&prefix, year, value);
        let parsed = parse_code(&code).unwrap();
        prop_assert_eq!(parsed.prefix, prefix);
        prop_assert_eq!(parsed.year, year);
        prop_assert_eq!(parsed.value, value);
    }

    /// Within one prefix and year, codes sort in counter order.
    #[test]
    fn prop_codes_sort_by_counter(
        prefix in prefix(),
        year in 2000i32..=2100,
        a in 1i64..100_000,
        b in 1i64..100_000,
    ) {
        let ca = format_code(&prefix, year, a);
        let cb = format_code(&prefix, year, b);
        prop_assert_eq!(a.cmp(&b), ca.cmp(&cb));
    }

    /// `next_after` yields a strictly greater counter in the same scope.
    #[test]
    fn prop_next_after_increments(
        prefix in prefix(),
        year in 2000i32..=2100,
        value in 1i64..1_000_000,
    ) {
        let last = format_code(&prefix, year, value);
        let next = next_after(&prefix, year, Some(&last)).unwrap();
        let parsed = parse_code(&next).unwrap();
        prop_assert_eq!(parsed.value, value + 1);
    }
}
