// src/models/money.rs

use rust_decimal::{Decimal, RoundingStrategy};

/// Arredonda para centavos (meio para longe do zero), a escala das colunas NUMERIC(12,2).
/// Sem isso o Postgres arredondaria sozinho e `total_amount` deixaria de bater com
/// `quantity_sold * unit_price`.
pub fn to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Maior preço que cabe em NUMERIC(12,2).
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(0xd4a50fff, 0xe8, 0, false, 2); // 999_999_999_999 escala 2

/// Maior total que cabe em NUMERIC(14,2).
pub const MAX_TOTAL_AMOUNT: Decimal = Decimal::from_parts(0x107a3fff, 0x5af3, 0, false, 2); // 99_999_999_999_999 escala 2

pub fn within_price_range(price: Decimal) -> bool {
    price <= MAX_UNIT_PRICE
}

/// `quantity * unit_price` sem estourar: `None` quando passa do que a coluna guarda.
pub fn checked_total(quantity: i32, unit_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .filter(|total| *total <= MAX_TOTAL_AMOUNT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(to_cents(dec!(1.005)), dec!(1.01));
        assert_eq!(to_cents(dec!(1.004)), dec!(1.00));
        assert_eq!(to_cents(dec!(29.99)), dec!(29.99));
        assert_eq!(to_cents(dec!(5)), dec!(5));
    }

    #[test]
    fn limits_match_the_numeric_columns() {
        assert_eq!(MAX_UNIT_PRICE, dec!(9999999999.99));
        assert_eq!(MAX_TOTAL_AMOUNT, dec!(999999999999.99));
        assert!(within_price_range(dec!(9999999999.99)));
        assert!(!within_price_range(dec!(10000000000)));
    }

    #[test]
    fn totals_never_overflow() {
        assert_eq!(checked_total(3, dec!(5.00)), Some(dec!(15.00)));
        assert_eq!(checked_total(100, dec!(9999999999.99)), Some(dec!(999999999999.00)));
        assert_eq!(checked_total(101, dec!(9999999999.99)), None);
        assert_eq!(checked_total(10, Decimal::from_scientific("1e28").unwrap()), None);
        assert_eq!(checked_total(i32::MAX, Decimal::MAX), None);
    }
}
