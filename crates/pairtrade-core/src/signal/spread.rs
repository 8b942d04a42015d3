use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::PricePoint;

/// Price difference between two aligned series, one value per common date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl SpreadSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Align two date-sorted price series on their common dates and take
/// `a − b`. Dates present in only one series are dropped, not interpolated.
pub fn align(a: &[PricePoint], b: &[PricePoint]) -> SpreadSeries {
    let mut dates = Vec::new();
    let mut values = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].date.cmp(&b[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dates.push(a[i].date);
                values.push(a[i].close - b[j].close);
                i += 1;
                j += 1;
            }
        }
    }

    SpreadSeries { dates, values }
}

/// Simple returns between consecutive values, one fewer than the input.
/// A zero previous value yields a 0.0 return rather than a division
/// blow-up.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { (w[1] - w[0]) / w[0] })
        .collect()
}
