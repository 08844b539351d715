use oracle_common::{OracleError, Quote, Result, SOURCE_AGGREGATED};
use tracing::{info, warn};

/// Median 기반 합의 가격 계산기
pub struct ConsensusReducer {
    /// 중간값 대비 경고 편차 (%, 예: 5.0 = 5%)
    outlier_warn_pct: f64,
}

impl ConsensusReducer {
    pub fn new(outlier_warn_pct: f64) -> Self {
        Self { outlier_warn_pct }
    }

    /// Reduce quotes to their median price.
    ///
    /// Quotes whose price is not finite and strictly positive are ignored. The
    /// result carries the symbol of a surviving quote, `source = "aggregated"`
    /// and the time of the reduction itself.
    pub fn reduce(&self, quotes: &[Quote]) -> Result<Quote> {
        if quotes.is_empty() {
            return Err(OracleError::NoValidPrices(
                "no quotes provided".to_string(),
            ));
        }

        let valid: Vec<&Quote> = quotes.iter().filter(|q| q.has_valid_price()).collect();
        let Some(first) = valid.first() else {
            return Err(OracleError::NoValidPrices(format!(
                "none of {} quotes had a finite positive price",
                quotes.len()
            )));
        };

        let mut prices: Vec<f64> = valid.iter().map(|q| q.price).collect();
        let median = median(&mut prices).ok_or_else(|| {
            OracleError::NoValidPrices("no prices to aggregate".to_string())
        })?;

        let outliers = self.detect_outliers(&valid, median);
        if !outliers.is_empty() {
            warn!(
                "Sources deviating more than {:.1}% from median {:.8} for {}: {:?}",
                self.outlier_warn_pct, median, first.symbol, outliers
            );
        }

        info!(
            "✅ Consensus for {}: {} from {} sources",
            first.symbol,
            median,
            valid.len()
        );

        Ok(Quote::new(first.symbol.clone(), median, SOURCE_AGGREGATED))
    }

    /// 아웃라이어 감지 (결과에는 영향 없음, 로그용)
    pub fn detect_outliers(&self, quotes: &[&Quote], median: f64) -> Vec<String> {
        if quotes.len() < 3 || median <= 0.0 {
            return vec![];
        }

        quotes
            .iter()
            .filter(|q| ((q.price - median) / median).abs() * 100.0 > self.outlier_warn_pct)
            .map(|q| q.source.clone())
            .collect()
    }
}

impl Default for ConsensusReducer {
    fn default() -> Self {
        Self::new(5.0)
    }
}

/// Median of a slice, sorting it in place. `None` for an empty slice.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        let (low, high) = (values[mid - 1], values[mid]);
        Some((low + high) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quotes(prices: &[f64]) -> Vec<Quote> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| Quote::new("BTC", price, format!("exchange{}", i)))
            .collect()
    }

    #[test]
    fn test_median_odd_count() {
        let result = ConsensusReducer::default()
            .reduce(&quotes(&[10.0, 20.0, 30.0]))
            .unwrap();
        assert_eq!(result.price, 20.0);
    }

    #[test]
    fn test_median_even_count() {
        let result = ConsensusReducer::default()
            .reduce(&quotes(&[10.0, 20.0]))
            .unwrap();
        assert_eq!(result.price, 15.0);
    }

    #[test]
    fn test_even_median_is_mean_of_middle_pair() {
        let mut values = [0.3, 0.1, 0.7, 0.2];
        assert_eq!(median(&mut values), Some((0.2 + 0.3) / 2.0));
        let mut empty: [f64; 0] = [];
        assert_eq!(median(&mut empty), None);
    }

    #[test]
    fn test_single_quote_is_its_own_median() {
        let result = ConsensusReducer::default()
            .reduce(&quotes(&[100.0]))
            .unwrap();
        assert_eq!(result.price, 100.0);
    }

    #[test]
    fn test_unsorted_input() {
        let result = ConsensusReducer::default()
            .reduce(&quotes(&[200.0, 100.0, 150.0]))
            .unwrap();
        assert_eq!(result.price, 150.0);
    }

    #[test]
    fn test_invalid_prices_are_ignored() {
        let result = ConsensusReducer::default()
            .reduce(&quotes(&[10.0, -5.0, f64::NAN, 30.0]))
            .unwrap();
        assert_eq!(result.price, 20.0);
    }

    #[test]
    fn test_infinite_price_is_ignored() {
        let result = ConsensusReducer::default()
            .reduce(&quotes(&[f64::INFINITY, 42.0]))
            .unwrap();
        assert_eq!(result.price, 42.0);
    }

    #[test]
    fn test_empty_input_fails() {
        let result = ConsensusReducer::default().reduce(&[]);
        assert!(matches!(result, Err(OracleError::NoValidPrices(_))));
    }

    #[test]
    fn test_all_invalid_input_fails() {
        let result = ConsensusReducer::default().reduce(&quotes(&[-1.0, 0.0, f64::NAN]));
        assert!(matches!(result, Err(OracleError::NoValidPrices(_))));
    }

    #[test]
    fn test_result_provenance() {
        let input = vec![
            Quote::new("ETH", 3000.0, "binance"),
            Quote::new("ETH", 3010.0, "kraken"),
        ];
        let before = chrono::Utc::now();
        let result = ConsensusReducer::default().reduce(&input).unwrap();

        assert_eq!(result.symbol, "ETH");
        assert_eq!(result.source, "aggregated");
        assert!(result.timestamp >= before);
        assert!(result.volume_24h.is_none());
    }

    #[test]
    fn test_outlier_does_not_skew_median() {
        let result = ConsensusReducer::default()
            .reduce(&quotes(&[70000.0, 70100.0, 700000.0]))
            .unwrap();
        assert_eq!(result.price, 70100.0);
    }

    #[test]
    fn test_detect_outliers() {
        let reducer = ConsensusReducer::default();
        let input = vec![
            Quote::new("BTC", 70000.0, "binance"),
            Quote::new("BTC", 70100.0, "coinbase"),
            Quote::new("BTC", 75000.0, "kraken"),
        ];
        let refs: Vec<&Quote> = input.iter().collect();

        let outliers = reducer.detect_outliers(&refs, 70100.0);
        assert_eq!(outliers, vec!["kraken".to_string()]);
    }

    #[test]
    fn test_detect_outliers_needs_three_sources() {
        let reducer = ConsensusReducer::default();
        let input = quotes(&[100.0, 1000.0]);
        let refs: Vec<&Quote> = input.iter().collect();

        assert!(reducer.detect_outliers(&refs, 550.0).is_empty());
    }
}
