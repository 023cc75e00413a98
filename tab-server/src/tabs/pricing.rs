//! Money calculation for tab lines
//!
//! Subtotals are computed from the unit price observed at the mutating call.
//! The tab total is always a full recomputation over the lines, never an
//! increment of the previous total.

use rust_decimal::prelude::*;
use shared::error::{AppError, ErrorCode};
use shared::models::TabItem;

/// Rounding for monetary values (2 decimal places, half away from zero)
pub const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price (1,000,000.00)
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Maximum quantity of a single line
pub const MAX_QUANTITY: u32 = 9999;

/// Round to 2 decimal places and pin the scale so `17` renders as `17.00`
pub fn to_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DECIMAL_PLACES);
    rounded
}

pub fn validate_unit_price(price: Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::new(ErrorCode::InvalidPrice).with_detail("price", price.to_string()));
    }
    if price > MAX_PRICE {
        return Err(AppError::with_message(
            ErrorCode::InvalidPrice,
            format!("price exceeds maximum allowed ({MAX_PRICE})"),
        )
        .with_detail("price", price.to_string()));
    }
    Ok(())
}

pub fn validate_quantity(quantity: i64) -> Result<u32, AppError> {
    if quantity <= 0 {
        return Err(AppError::new(ErrorCode::InvalidQuantity).with_detail("quantity", quantity));
    }
    if quantity > i64::from(MAX_QUANTITY) {
        return Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            format!("quantity exceeds maximum allowed ({MAX_QUANTITY})"),
        )
        .with_detail("quantity", quantity));
    }
    Ok(quantity as u32)
}

/// `round(unit_price × quantity, 2)`
pub fn subtotal(unit_price: Decimal, quantity: u32) -> Result<Decimal, AppError> {
    validate_unit_price(unit_price)?;
    validate_quantity(i64::from(quantity))?;
    Ok(to_money(unit_price * Decimal::from(quantity)))
}

/// Sum of line subtotals, rounded to 2 decimal places
pub fn total<'a>(items: impl IntoIterator<Item = &'a TabItem>) -> Decimal {
    to_money(items.into_iter().map(|item| item.subtotal).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(subtotal: Decimal) -> TabItem {
        TabItem {
            id: 1,
            tab_id: 1,
            menu_item_id: 1,
            quantity: 1,
            subtotal,
            served: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_subtotal_multiplies_and_rounds() {
        assert_eq!(subtotal(Decimal::new(850, 2), 2).unwrap(), Decimal::new(1700, 2));
        assert_eq!(subtotal(Decimal::new(850, 2), 3).unwrap(), Decimal::new(2550, 2));
        // 0.335 × 3 = 1.005 → 1.01
        assert_eq!(subtotal(Decimal::new(335, 3), 3).unwrap(), Decimal::new(101, 2));
    }

    #[test]
    fn test_subtotal_scale_is_two() {
        let value = subtotal(Decimal::new(17, 0), 1).unwrap();
        assert_eq!(value.to_string(), "17.00");
        assert_eq!(to_money(Decimal::new(85, 1)).to_string(), "8.50");
    }

    #[test]
    fn test_zero_price_allowed() {
        assert_eq!(subtotal(Decimal::ZERO, 4).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = subtotal(Decimal::new(-1, 2), 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPrice);
    }

    #[test]
    fn test_price_above_max_rejected() {
        let err = subtotal(MAX_PRICE + Decimal::ONE, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPrice);
        assert!(subtotal(MAX_PRICE, 1).is_ok());
    }

    #[test]
    fn test_quantity_bounds() {
        assert_eq!(validate_quantity(1).unwrap(), 1);
        assert_eq!(validate_quantity(9999).unwrap(), 9999);
        assert_eq!(validate_quantity(0).unwrap_err().code, ErrorCode::InvalidQuantity);
        assert_eq!(validate_quantity(-2).unwrap_err().code, ErrorCode::InvalidQuantity);
        assert_eq!(validate_quantity(10_000).unwrap_err().code, ErrorCode::InvalidQuantity);
    }

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let items = vec![
            item(Decimal::new(2550, 2)),
            item(Decimal::new(399, 2)),
            item(Decimal::new(1, 2)),
        ];
        assert_eq!(total(&items), Decimal::new(2950, 2));
        assert_eq!(total(&items), total(&items));
    }

    #[test]
    fn test_total_of_empty_tab_is_zero() {
        let value = total(&Vec::<TabItem>::new());
        assert_eq!(value, Decimal::ZERO);
        assert_eq!(value.to_string(), "0.00");
    }
}
