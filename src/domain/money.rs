use bigdecimal::{BigDecimal, RoundingMode};

/// Round a monetary amount to two decimal places, half-up.
pub fn round_money(amount: BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

/// `unit_price × quantity`, unrounded.
pub fn line_subtotal(unit_price: &BigDecimal, quantity: i32) -> BigDecimal {
    unit_price * BigDecimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_money(dec("1.005")), dec("1.01"));
        assert_eq!(round_money(dec("1.004")), dec("1.00"));
    }

    #[test]
    fn keeps_two_places_for_whole_amounts() {
        assert_eq!(round_money(dec("1350")), dec("1350.00"));
    }

    #[test]
    fn subtotal_multiplies_by_quantity() {
        assert_eq!(line_subtotal(&dec("400.00"), 2), dec("800.00"));
    }
}
