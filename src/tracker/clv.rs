//! Closing line value

use crate::market::implied_probability;
use crate::model::round2;
use rust_decimal::Decimal;

/// Implied-probability shift from opening to closing price, in points.
///
/// Positive when the price shortened, i.e. the market moved toward the
/// selection. `None` if either price is not a valid decimal price.
pub fn closing_line_value(opening: Decimal, closing: Decimal) -> Option<f64> {
    let opening = implied_probability(opening)?;
    let closing = implied_probability(closing)?;
    Some(round2(closing - opening))
}
