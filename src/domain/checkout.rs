//! Order assembly: converts a cart snapshot into a durable order.
//!
//! The flow runs against a [`CheckoutUnitOfWork`] — a transaction-scoped
//! storage surface owned by the caller. Either every write in the flow
//! commits, or the transaction rolls back and nothing is observable.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::money::{line_subtotal, round_money};
use super::order::NewOrderInput;
use super::status::OrderStatus;

/// A cart line joined with the product fields checkout validates against.
/// `available_stock` must be read under the same lock the decrement uses.
#[derive(Debug, Clone)]
pub struct CartLineWithProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: BigDecimal,
    pub available_stock: i32,
    pub is_active: bool,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct NewOrderRecord {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub shipping_address: String,
    pub payment_method: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrderLineRecord {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// Storage operations of the checkout flow. All calls happen inside one
/// transaction; `decrement_stock` must be atomic relative to concurrent
/// decrements on the same product and fail with `InsufficientStock` rather
/// than drive stock below zero. There is no compensating-action path —
/// rollback is the only recovery.
pub trait CheckoutUnitOfWork {
    fn load_cart_with_products(
        &mut self,
        user_id: Uuid,
    ) -> Result<Vec<CartLineWithProduct>, DomainError>;

    fn create_order(
        &mut self,
        order: NewOrderRecord,
        lines: Vec<NewOrderLineRecord>,
    ) -> Result<(), DomainError>;

    fn decrement_stock(&mut self, product_id: Uuid, amount: i32) -> Result<(), DomainError>;

    fn delete_cart_lines(&mut self, user_id: Uuid) -> Result<(), DomainError>;
}

/// Sum of `unit_price × quantity` over the cart, two decimal places, half-up.
pub fn order_total(lines: &[CartLineWithProduct]) -> BigDecimal {
    let sum = lines.iter().fold(BigDecimal::from(0), |acc, line| {
        acc + line_subtotal(&line.unit_price, line.quantity)
    });
    round_money(sum)
}

/// Time-based order number with a user fragment, e.g. `ORD-1718000000000-9f3c01ab`.
/// Unique in practice; the column's UNIQUE constraint backstops collisions.
pub fn generate_order_number(user_id: Uuid, at: DateTime<Utc>) -> String {
    let user = user_id.simple().to_string();
    format!("ORD-{}-{}", at.timestamp_millis(), &user[..8])
}

/// Place an order from the user's cart.
///
/// Validates every line against the live product record, freezes per-line
/// prices, writes the order and its lines, decrements stock, and clears the
/// cart — in that sequence, entirely inside the caller's transaction. Any
/// failure leaves the cart, inventory, and order tables untouched.
pub fn assemble_order<U: CheckoutUnitOfWork + ?Sized>(
    uow: &mut U,
    user_id: Uuid,
    input: NewOrderInput,
) -> Result<Uuid, DomainError> {
    let lines = uow.load_cart_with_products(user_id)?;
    if lines.is_empty() {
        return Err(DomainError::EmptyCart);
    }

    for line in &lines {
        if !line.is_active {
            return Err(DomainError::ProductUnavailable {
                name: line.product_name.clone(),
            });
        }
        if line.available_stock < line.quantity {
            return Err(DomainError::InsufficientStock {
                name: line.product_name.clone(),
                available: line.available_stock,
            });
        }
    }

    let order_id = Uuid::new_v4();
    let order = NewOrderRecord {
        id: order_id,
        order_number: generate_order_number(user_id, Utc::now()),
        user_id,
        status: OrderStatus::Pending,
        total_amount: order_total(&lines),
        shipping_address: input.shipping_address,
        payment_method: input.payment_method,
        notes: input.notes,
    };
    let order_lines = lines
        .iter()
        .map(|line| NewOrderLineRecord {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price.clone(),
        })
        .collect();

    uow.create_order(order, order_lines)?;
    for line in &lines {
        uow.decrement_stock(line.product_id, line.quantity)?;
    }
    uow.delete_cart_lines(user_id)?;

    Ok(order_id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::str::FromStr;

    use super::*;

    #[derive(Default)]
    struct FakeUow {
        cart: Vec<CartLineWithProduct>,
        stock: HashMap<Uuid, i32>,
        orders: Vec<(NewOrderRecord, Vec<NewOrderLineRecord>)>,
        cart_cleared: bool,
    }

    impl FakeUow {
        fn with_line(mut self, price: &str, stock: i32, quantity: i32, active: bool) -> Self {
            let product_id = Uuid::new_v4();
            self.stock.insert(product_id, stock);
            self.cart.push(CartLineWithProduct {
                product_id,
                product_name: format!("product-{}", self.cart.len()),
                unit_price: BigDecimal::from_str(price).unwrap(),
                available_stock: stock,
                is_active: active,
                quantity,
            });
            self
        }
    }

    impl CheckoutUnitOfWork for FakeUow {
        fn load_cart_with_products(
            &mut self,
            _user_id: Uuid,
        ) -> Result<Vec<CartLineWithProduct>, DomainError> {
            Ok(self.cart.clone())
        }

        fn create_order(
            &mut self,
            order: NewOrderRecord,
            lines: Vec<NewOrderLineRecord>,
        ) -> Result<(), DomainError> {
            self.orders.push((order, lines));
            Ok(())
        }

        fn decrement_stock(&mut self, product_id: Uuid, amount: i32) -> Result<(), DomainError> {
            let stock = self.stock.get_mut(&product_id).expect("unknown product");
            if *stock < amount {
                return Err(DomainError::InsufficientStock {
                    name: product_id.to_string(),
                    available: *stock,
                });
            }
            *stock -= amount;
            Ok(())
        }

        fn delete_cart_lines(&mut self, _user_id: Uuid) -> Result<(), DomainError> {
            self.cart.clear();
            self.cart_cleared = true;
            Ok(())
        }
    }

    fn input() -> NewOrderInput {
        NewOrderInput {
            shipping_address: "1 Main St".to_string(),
            payment_method: "cash".to_string(),
            notes: None,
        }
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn places_order_and_freezes_prices() {
        // cart = [{400.00 × 2}, {550.00 × 1}], stock 5 and 3
        let mut uow = FakeUow::default()
            .with_line("400.00", 5, 2, true)
            .with_line("550.00", 3, 1, true);
        let a = uow.cart[0].product_id;
        let b = uow.cart[1].product_id;
        let user_id = Uuid::new_v4();

        let order_id = assemble_order(&mut uow, user_id, input()).expect("order should succeed");

        assert_eq!(uow.orders.len(), 1);
        let (order, lines) = &uow.orders[0];
        assert_eq!(order.id, order_id);
        assert_eq!(order.user_id, user_id);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, dec("1350.00"));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit_price, dec("400.00"));
        assert_eq!(lines[1].unit_price, dec("550.00"));
        assert_eq!(uow.stock[&a], 3);
        assert_eq!(uow.stock[&b], 2);
        assert!(uow.cart_cleared);
    }

    #[test]
    fn empty_cart_fails_without_writes() {
        let mut uow = FakeUow::default();

        let err = assemble_order(&mut uow, Uuid::new_v4(), input()).unwrap_err();

        assert!(matches!(err, DomainError::EmptyCart));
        assert!(uow.orders.is_empty());
        assert!(!uow.cart_cleared);
    }

    #[test]
    fn inactive_product_aborts_whole_order() {
        let mut uow = FakeUow::default()
            .with_line("10.00", 5, 1, true)
            .with_line("20.00", 5, 1, false);
        let stock_before = uow.stock.clone();

        let err = assemble_order(&mut uow, Uuid::new_v4(), input()).unwrap_err();

        assert!(matches!(err, DomainError::ProductUnavailable { .. }));
        assert!(uow.orders.is_empty());
        assert_eq!(uow.stock, stock_before);
        assert!(!uow.cart_cleared);
    }

    #[test]
    fn insufficient_stock_reports_remaining_quantity() {
        let mut uow = FakeUow::default().with_line("10.00", 2, 3, true);

        let err = assemble_order(&mut uow, Uuid::new_v4(), input()).unwrap_err();

        match err {
            DomainError::InsufficientStock { available, .. } => assert_eq!(available, 2),
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert!(uow.orders.is_empty());
        assert!(!uow.cart_cleared);
    }

    #[test]
    fn total_rounds_half_up() {
        let lines = [CartLineWithProduct {
            product_id: Uuid::new_v4(),
            product_name: "x".to_string(),
            unit_price: dec("0.125"),
            available_stock: 1,
            is_active: true,
            quantity: 1,
        }];
        assert_eq!(order_total(&lines), dec("0.13"));
    }

    #[test]
    fn order_number_embeds_timestamp_and_user_fragment() {
        let user_id = Uuid::new_v4();
        let at = Utc::now();
        let number = generate_order_number(user_id, at);

        assert!(number.starts_with(&format!("ORD-{}-", at.timestamp_millis())));
        assert!(number.ends_with(&user_id.simple().to_string()[..8]));
    }
}
