use oracle_node::{ConsensusReducer, OracleError, Quote};
use proptest::prelude::*;

fn create_quote(source: &str, price: f64) -> Quote {
    Quote::new("BTC", price, source)
}

fn quotes(prices: &[f64]) -> Vec<Quote> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| create_quote(&format!("exchange{}", i), p))
        .collect()
}

fn reduce(prices: &[f64]) -> Result<f64, OracleError> {
    ConsensusReducer::default()
        .reduce(&quotes(prices))
        .map(|q| q.price)
}

#[test]
fn test_median_examples() {
    assert_eq!(reduce(&[10.0, 20.0, 30.0]).unwrap(), 20.0);
    assert_eq!(reduce(&[10.0, 20.0]).unwrap(), 15.0);
    assert_eq!(reduce(&[100.0]).unwrap(), 100.0);
}

#[test]
fn test_invalid_entries_are_ignored_not_zero_filled() {
    assert_eq!(reduce(&[10.0, -5.0, f64::NAN, 30.0]).unwrap(), 20.0);
    assert_eq!(
        reduce(&[10.0, -5.0, f64::NAN, 30.0]).unwrap(),
        reduce(&[10.0, 30.0]).unwrap()
    );
}

#[test]
fn test_no_valid_prices() {
    assert!(matches!(reduce(&[]), Err(OracleError::NoValidPrices(_))));
    assert!(matches!(
        reduce(&[-1.0, 0.0, f64::NAN]),
        Err(OracleError::NoValidPrices(_))
    ));
}

#[test]
fn test_consensus_with_outlier() {
    // 한 거래소의 잘못된 가격이 결과를 왜곡하지 않음
    let prices = vec![
        create_quote("binance", 70000.0),
        create_quote("coinbase", 70100.0),
        create_quote("kraken", 75000.0),
    ];

    let result = ConsensusReducer::default().reduce(&prices).unwrap();
    assert_eq!(result.price, 70100.0);
    assert_eq!(result.source, "aggregated");
}

fn valid_price() -> impl Strategy<Value = f64> {
    1e-8f64..1e9f64
}

fn invalid_price() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
        -1e9f64..0.0f64,
    ]
}

proptest! {
    #[test]
    fn prop_median_is_bounded_by_inputs(prices in prop::collection::vec(valid_price(), 1..50)) {
        let median = reduce(&prices).unwrap();
        let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        prop_assert!(median >= min && median <= max, "{} not in [{}, {}]", median, min, max);
    }

    #[test]
    fn prop_median_is_order_independent(prices in prop::collection::vec(valid_price(), 1..50)) {
        let mut reversed = prices.clone();
        reversed.reverse();
        let mut sorted = prices.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let median = reduce(&prices).unwrap();
        prop_assert_eq!(median, reduce(&reversed).unwrap());
        prop_assert_eq!(median, reduce(&sorted).unwrap());
    }

    #[test]
    fn prop_invalid_quotes_do_not_change_result(
        valid in prop::collection::vec(valid_price(), 1..20),
        invalid in prop::collection::vec(invalid_price(), 0..20),
    ) {
        let mut mixed = invalid.clone();
        mixed.extend(valid.iter().cloned());

        prop_assert_eq!(reduce(&mixed).unwrap(), reduce(&valid).unwrap());
    }

    #[test]
    fn prop_only_invalid_quotes_fail(invalid in prop::collection::vec(invalid_price(), 0..20)) {
        prop_assert!(matches!(reduce(&invalid), Err(OracleError::NoValidPrices(_))));
    }
}
