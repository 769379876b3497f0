//! Merchant-category classification
//!
//! Maps an MCC to the balance category a transfer draws from. The table is a
//! fixed policy; anything it does not list is paid from cash.

use crate::types::Category;

/// MCCs with a dedicated balance
const MCC_TABLE: [(&str, Category); 4] = [
    ("5411", Category::Food),
    ("5412", Category::Food),
    ("5811", Category::Meal),
    ("5812", Category::Meal),
];

/// Classify a merchant-category code
///
/// Pure and total: unknown, empty, or malformed codes fall through to
/// `Category::Cash`.
pub fn classify(mcc: &str) -> Category {
    MCC_TABLE
        .iter()
        .find(|(code, _)| *code == mcc)
        .map(|(_, category)| *category)
        .unwrap_or(Category::Cash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::grocery("5411", Category::Food)]
    #[case::supermarket("5412", Category::Food)]
    #[case::restaurant("5811", Category::Meal)]
    #[case::fast_food("5812", Category::Meal)]
    #[case::other("5999", Category::Cash)]
    #[case::neighbour_code("5413", Category::Cash)]
    #[case::empty("", Category::Cash)]
    #[case::padded(" 5411", Category::Cash)]
    #[case::non_numeric("ABCD", Category::Cash)]
    fn test_classify(#[case] mcc: &str, #[case] expected: Category) {
        assert_eq!(classify(mcc), expected);
    }

    #[test]
    fn test_classify_is_deterministic() {
        for mcc in ["5411", "5811", "0000", "9999"] {
            assert_eq!(classify(mcc), classify(mcc));
        }
    }
}
