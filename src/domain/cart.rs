use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::money::{line_subtotal, round_money};
use crate::models::cart_item::CartItem;

/// Product fields the cart needs to render a line and validate it.
#[derive(Debug, Clone)]
pub struct CartProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub images: Vec<String>,
    pub stock: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct CartLine {
    pub item: CartItem,
    pub product: CartProductSummary,
}

/// Running total over the cart, two decimal places.
pub fn cart_total(lines: &[CartLine]) -> BigDecimal {
    let sum = lines.iter().fold(BigDecimal::from(0), |acc, line| {
        acc + line_subtotal(&line.product.price, line.item.quantity)
    });
    round_money(sum)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::Utc;

    use super::*;

    fn line(price: &str, quantity: i32) -> CartLine {
        let now = Utc::now();
        CartLine {
            item: CartItem {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                quantity,
                created_at: now,
                updated_at: now,
            },
            product: CartProductSummary {
                id: Uuid::new_v4(),
                name: "test".to_string(),
                price: BigDecimal::from_str(price).unwrap(),
                images: vec![],
                stock: 100,
                is_active: true,
            },
        }
    }

    #[test]
    fn empty_cart_totals_zero() {
        assert_eq!(cart_total(&[]), BigDecimal::from_str("0.00").unwrap());
    }

    #[test]
    fn total_sums_price_times_quantity() {
        let lines = vec![line("400.00", 2), line("550.00", 1)];
        assert_eq!(cart_total(&lines), BigDecimal::from_str("1350.00").unwrap());
    }
}
