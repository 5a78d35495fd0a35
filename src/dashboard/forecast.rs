//! Next-month spending forecasts.
//!
//! Fits a least-squares line to each category's monthly totals and evaluates
//! it one month past the observed history. Zero months are treated as gaps:
//! the fit uses only the nonzero points unless there are too few of them.

/// A category's forecast spend for the month after the observed history.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategoryPrediction {
    /// The spending category the forecast applies to.
    pub category: String,
    /// The predicted amount, floored at zero and rounded to two decimals.
    pub predicted: f64,
}

/// Computes a forecast for every category with enough history.
///
/// Zero-valued forecasts are kept so the chart can plot their markers; views
/// that only want meaningful amounts filter on `predicted > 0` themselves.
pub(super) fn predict_spending(spending: &[(String, Vec<f64>)]) -> Vec<CategoryPrediction> {
    spending
        .iter()
        .filter_map(|(category, values)| {
            predict_next_month(values).map(|predicted| CategoryPrediction {
                category: category.clone(),
                predicted,
            })
        })
        .collect()
}

/// Predicts the value following a monthly series with a least-squares line fit.
///
/// Each value is paired with its month index. The line is fitted through the
/// nonzero points, falling back to all points when fewer than two are nonzero,
/// and evaluated at the index after the last point used. Histories shorter
/// than two months, or with no nonzero value at all, produce `None`.
pub(super) fn predict_next_month(values: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(index, &value)| (index as f64, value))
        .collect();
    let nonzero: Vec<(f64, f64)> = pairs
        .iter()
        .copied()
        .filter(|&(_, value)| value != 0.0)
        .collect();

    if pairs.len() < 2 || nonzero.is_empty() {
        return None;
    }

    let points = if nonzero.len() >= 2 { &nonzero } else { &pairs };

    let next_index = points
        .iter()
        .map(|&(index, _)| index)
        .fold(f64::MIN, f64::max)
        + 1.0;

    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|&(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|&(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|&(x, y)| x * y).sum();
    let sum_xx: f64 = points.iter().map(|&(x, _)| x * x).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    let raw = if denominator == 0.0 {
        sum_y / n
    } else {
        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;
        slope * next_index + intercept
    };

    let rounded = (raw * 100.0).round() / 100.0;
    Some(rounded.max(0.0))
}

#[cfg(test)]
mod tests {
    use crate::dashboard::forecast::{
        CategoryPrediction, predict_next_month, predict_spending,
    };

    #[test]
    fn two_month_history_extends_the_line() {
        // 10 then 20 per month, so the fitted line continues to 30.
        assert_eq!(predict_next_month(&[10.0, 20.0]), Some(30.0));
    }

    #[test]
    fn single_month_history_is_skipped() {
        assert_eq!(predict_next_month(&[10.0]), None);
    }

    #[test]
    fn all_zero_history_is_skipped() {
        assert_eq!(predict_next_month(&[0.0, 0.0, 0.0]), None);
    }

    #[test]
    fn zero_months_are_left_out_of_the_fit() {
        // The nonzero points (index 0, 10) and (index 2, 20) give a slope of
        // 5 per month, evaluated at index 3.
        assert_eq!(predict_next_month(&[10.0, 0.0, 20.0]), Some(25.0));
    }

    #[test]
    fn single_nonzero_point_falls_back_to_all_points() {
        // Only (index 1, 10) is nonzero, so the line is fitted through both
        // points including the zero month.
        assert_eq!(predict_next_month(&[0.0, 10.0]), Some(20.0));
    }

    #[test]
    fn downward_trend_floors_at_zero() {
        assert_eq!(predict_next_month(&[30.0, 10.0]), Some(0.0));
    }

    #[test]
    fn prediction_rounds_to_two_decimals() {
        let predicted = predict_next_month(&[10.0, 10.111]).unwrap();

        assert_eq!(predicted, 10.22);
    }

    #[test]
    fn predict_spending_keeps_zero_forecasts() {
        let spending = vec![
            ("Groceries".to_owned(), vec![10.0, 20.0]),
            ("Transport".to_owned(), vec![30.0, 10.0]),
            ("Rent".to_owned(), vec![800.0]),
        ];

        let predictions = predict_spending(&spending);

        assert_eq!(
            predictions,
            vec![
                CategoryPrediction {
                    category: "Groceries".to_owned(),
                    predicted: 30.0,
                },
                CategoryPrediction {
                    category: "Transport".to_owned(),
                    predicted: 0.0,
                },
            ]
        );
    }
}
