use std::collections::HashMap;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::checkout::{
    self, CartLineWithProduct, CheckoutUnitOfWork, NewOrderLineRecord, NewOrderRecord,
};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    NewOrderInput, OrderDetail, OrderFilter, OrderLineView, OrderPage, OrderScope, OrderView,
    ProductSummary, UserSummary,
};
use crate::domain::ports::OrderRepository;
use crate::domain::status::OrderStatus;
use crate::models::order::{NewOrder, Order};
use crate::models::order_line::{NewOrderLine, OrderLine};
use crate::models::user::User;
use crate::schema::{cart_items, order_lines, orders, products, users};

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

// ── Checkout unit of work ─────────────────────────────────────────────────────

/// Storage surface of one checkout, scoped to the enclosing transaction.
/// Dropping without commit rolls everything back; there is no other recovery.
struct CheckoutTxn<'a> {
    conn: &'a mut PgConnection,
}

impl CheckoutUnitOfWork for CheckoutTxn<'_> {
    fn load_cart_with_products(
        &mut self,
        user_id: Uuid,
    ) -> Result<Vec<CartLineWithProduct>, DomainError> {
        let conn = &mut *self.conn;

        let items: Vec<(Uuid, i32)> = cart_items::table
            .filter(cart_items::user_id.eq(user_id))
            .order(cart_items::created_at.asc())
            .select((cart_items::product_id, cart_items::quantity))
            .load(conn)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        // Lock the product rows for the rest of the transaction so the
        // validated stock cannot change under a concurrent checkout.
        let product_ids: Vec<Uuid> = items.iter().map(|(id, _)| *id).collect();
        let rows: Vec<(Uuid, String, bigdecimal::BigDecimal, i32, bool)> = products::table
            .filter(products::id.eq_any(&product_ids))
            .for_update()
            .select((
                products::id,
                products::name,
                products::price,
                products::stock,
                products::is_active,
            ))
            .load(conn)?;
        let by_id: HashMap<Uuid, (String, bigdecimal::BigDecimal, i32, bool)> = rows
            .into_iter()
            .map(|(id, name, price, stock, is_active)| (id, (name, price, stock, is_active)))
            .collect();

        items
            .into_iter()
            .map(|(product_id, quantity)| {
                let (name, price, stock, is_active) = by_id
                    .get(&product_id)
                    .cloned()
                    .ok_or(DomainError::NotFound("Product"))?;
                Ok(CartLineWithProduct {
                    product_id,
                    product_name: name,
                    unit_price: price,
                    available_stock: stock,
                    is_active,
                    quantity,
                })
            })
            .collect()
    }

    fn create_order(
        &mut self,
        order: NewOrderRecord,
        lines: Vec<NewOrderLineRecord>,
    ) -> Result<(), DomainError> {
        let conn = &mut *self.conn;

        diesel::insert_into(orders::table)
            .values(&NewOrder {
                id: order.id,
                order_number: order.order_number,
                user_id: order.user_id,
                status: order.status.as_str().to_string(),
                total_amount: order.total_amount,
                shipping_address: order.shipping_address,
                payment_method: order.payment_method,
                notes: order.notes,
            })
            .execute(conn)?;

        let rows: Vec<NewOrderLine> = lines
            .into_iter()
            .map(|line| NewOrderLine {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        diesel::insert_into(order_lines::table)
            .values(&rows)
            .execute(conn)?;

        Ok(())
    }

    fn decrement_stock(&mut self, product_id: Uuid, amount: i32) -> Result<(), DomainError> {
        let conn = &mut *self.conn;

        // Conditional form: a concurrent decrement that got there first makes
        // this match zero rows instead of driving stock negative.
        let updated = diesel::update(
            products::table.filter(products::id.eq(product_id).and(products::stock.ge(amount))),
        )
        .set((
            products::stock.eq(products::stock - amount),
            products::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;

        if updated == 0 {
            let (name, available): (String, i32) = products::table
                .filter(products::id.eq(product_id))
                .select((products::name, products::stock))
                .first(conn)?;
            return Err(DomainError::InsufficientStock { name, available });
        }
        Ok(())
    }

    fn delete_cart_lines(&mut self, user_id: Uuid) -> Result<(), DomainError> {
        diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id)))
            .execute(&mut *self.conn)?;
        Ok(())
    }
}

// ── View loading helpers ──────────────────────────────────────────────────────

fn load_lines(
    conn: &mut PgConnection,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<OrderLineView>>, DomainError> {
    let rows: Vec<(OrderLine, (Uuid, String, Vec<String>))> = order_lines::table
        .inner_join(products::table)
        .filter(order_lines::order_id.eq_any(order_ids))
        .order(order_lines::created_at.asc())
        .select((
            OrderLine::as_select(),
            (products::id, products::name, products::images),
        ))
        .load(conn)?;

    let mut by_order: HashMap<Uuid, Vec<OrderLineView>> = HashMap::new();
    for (line, (product_id, name, images)) in rows {
        let order_id = line.order_id;
        by_order.entry(order_id).or_default().push(OrderLineView {
            line,
            product: ProductSummary {
                id: product_id,
                name,
                images,
            },
        });
    }
    Ok(by_order)
}

fn user_summary(user: User) -> UserSummary {
    UserSummary {
        id: user.id,
        username: user.username,
        email: user.email,
        phone: user.phone,
    }
}

fn load_order_view(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<Option<OrderView>, DomainError> {
    let order = orders::table
        .find(order_id)
        .select(Order::as_select())
        .first(conn)
        .optional()?;
    let Some(order) = order else {
        return Ok(None);
    };

    let lines = load_lines(conn, &[order.id])?
        .remove(&order.id)
        .unwrap_or_default();
    Ok(Some(OrderView { order, lines }))
}

// ── Repository ────────────────────────────────────────────────────────────────

impl OrderRepository for DieselOrderRepository {
    fn place(&self, user_id: Uuid, input: NewOrderInput) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        let order_id = conn.transaction::<_, DomainError, _>(|conn| {
            let mut txn = CheckoutTxn { conn };
            checkout::assemble_order(&mut txn, user_id, input)
        })?;

        load_order_view(&mut conn, order_id)?.ok_or(DomainError::NotFound("Order"))
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows: Vec<Order> = orders::table
            .filter(orders::user_id.eq(user_id))
            .order(orders::created_at.desc())
            .select(Order::as_select())
            .load(&mut conn)?;

        let ids: Vec<Uuid> = rows.iter().map(|o| o.id).collect();
        let mut lines = load_lines(&mut conn, &ids)?;

        Ok(rows
            .into_iter()
            .map(|order| {
                let lines = lines.remove(&order.id).unwrap_or_default();
                OrderView { order, lines }
            })
            .collect())
    }

    fn find_scoped(&self, id: Uuid, scope: OrderScope) -> Result<Option<OrderDetail>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = orders::table
            .inner_join(users::table)
            .filter(orders::id.eq(id))
            .into_boxed();
        if let OrderScope::Owner(owner_id) = scope {
            query = query.filter(orders::user_id.eq(owner_id));
        }
        let row: Option<(Order, User)> = query
            .select((Order::as_select(), User::as_select()))
            .first(&mut conn)
            .optional()?;
        let Some((order, user)) = row else {
            return Ok(None);
        };

        let lines = load_lines(&mut conn, &[order.id])?
            .remove(&order.id)
            .unwrap_or_default();
        Ok(Some(OrderDetail {
            order,
            lines,
            user: user_summary(user),
        }))
    }

    fn list_all(&self, filter: OrderFilter) -> Result<OrderPage, DomainError> {
        let mut conn = self.pool.get()?;

        let mut count_query = orders::table.into_boxed();
        if let Some(status) = filter.status {
            count_query = count_query.filter(orders::status.eq(status.as_str()));
        }
        let total: i64 = count_query.count().get_result(&mut conn)?;

        let mut query = orders::table.inner_join(users::table).into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(orders::status.eq(status.as_str()));
        }
        let offset = (filter.page - 1) * filter.limit;
        let rows: Vec<(Order, User)> = query
            .order(orders::created_at.desc())
            .limit(filter.limit)
            .offset(offset)
            .select((Order::as_select(), User::as_select()))
            .load(&mut conn)?;

        let ids: Vec<Uuid> = rows.iter().map(|(o, _)| o.id).collect();
        let mut lines = load_lines(&mut conn, &ids)?;

        Ok(OrderPage {
            items: rows
                .into_iter()
                .map(|(order, user)| {
                    let lines = lines.remove(&order.id).unwrap_or_default();
                    OrderDetail {
                        order,
                        lines,
                        user: user_summary(user),
                    }
                })
                .collect(),
            total,
        })
    }

    fn update_status(&self, id: Uuid, next: OrderStatus) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let current: Option<String> = orders::table
                .find(id)
                .select(orders::status)
                .for_update()
                .first(conn)
                .optional()?;
            let Some(current) = current else {
                return Err(DomainError::NotFound("Order"));
            };
            let current: OrderStatus = current
                .parse()
                .map_err(|_| DomainError::Storage(format!("corrupt status on order {id}")))?;

            if !current.can_transition_to(next) {
                return Err(DomainError::InvalidTransition {
                    from: current,
                    to: next,
                });
            }

            let order = diesel::update(orders::table.find(id))
                .set((
                    orders::status.eq(next.as_str()),
                    orders::updated_at.eq(Utc::now()),
                ))
                .returning(Order::as_returning())
                .get_result(conn)?;
            Ok(order)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use diesel::prelude::*;

    use super::*;
    use crate::infrastructure::test_support::{
        cart_len, deactivate_product, product_stock, seed_cart_item, seed_category, seed_product,
        seed_user, setup_db,
    };

    fn input() -> NewOrderInput {
        NewOrderInput {
            shipping_address: "12 Harbor Lane".to_string(),
            payment_method: "cash".to_string(),
            notes: None,
        }
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn order_count(pool: &crate::db::DbPool) -> i64 {
        let mut conn = pool.get().unwrap();
        orders::table.count().get_result(&mut conn).unwrap()
    }

    #[tokio::test]
    async fn place_creates_order_decrements_stock_and_clears_cart() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = seed_user(&pool, "buyer");
        let category_id = seed_category(&pool, "Perfume");
        let product_a = seed_product(&pool, category_id, "Amber Noir", "400.00", 5);
        let product_b = seed_product(&pool, category_id, "Velvet Iris", "550.00", 3);
        seed_cart_item(&pool, user_id, product_a, 2);
        seed_cart_item(&pool, user_id, product_b, 1);

        let view = repo.place(user_id, input()).expect("place failed");

        assert_eq!(view.order.user_id, user_id);
        assert_eq!(view.order.status, "pending");
        assert_eq!(view.order.total_amount, dec("1350.00"));
        assert!(view.order.order_number.starts_with("ORD-"));
        assert_eq!(view.lines.len(), 2);
        assert_eq!(product_stock(&pool, product_a), 3);
        assert_eq!(product_stock(&pool, product_b), 2);
        assert_eq!(cart_len(&pool, user_id), 0);
    }

    #[tokio::test]
    async fn place_with_empty_cart_fails_and_writes_nothing() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = seed_user(&pool, "empty-buyer");

        let err = repo.place(user_id, input()).unwrap_err();

        assert!(matches!(err, DomainError::EmptyCart));
        assert_eq!(order_count(&pool), 0);
    }

    #[tokio::test]
    async fn place_with_short_stock_rolls_back_every_table() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = seed_user(&pool, "greedy-buyer");
        let category_id = seed_category(&pool, "Musk");
        let product_a = seed_product(&pool, category_id, "Plenty", "10.00", 5);
        let product_b = seed_product(&pool, category_id, "Scarce", "20.00", 2);
        seed_cart_item(&pool, user_id, product_a, 1);
        seed_cart_item(&pool, user_id, product_b, 4);

        let err = repo.place(user_id, input()).unwrap_err();

        match err {
            DomainError::InsufficientStock { name, available } => {
                assert_eq!(name, "Scarce");
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        // No partial order: both stocks untouched, cart intact.
        assert_eq!(order_count(&pool), 0);
        assert_eq!(product_stock(&pool, product_a), 5);
        assert_eq!(product_stock(&pool, product_b), 2);
        assert_eq!(cart_len(&pool, user_id), 2);
    }

    #[tokio::test]
    async fn place_with_inactive_product_fails_whole_order() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = seed_user(&pool, "unlucky-buyer");
        let category_id = seed_category(&pool, "Amber");
        let product_id = seed_product(&pool, category_id, "Retired Blend", "60.00", 8);
        seed_cart_item(&pool, user_id, product_id, 1);
        deactivate_product(&pool, product_id);

        let err = repo.place(user_id, input()).unwrap_err();

        assert!(matches!(err, DomainError::ProductUnavailable { .. }));
        assert_eq!(order_count(&pool), 0);
        assert_eq!(product_stock(&pool, product_id), 8);
    }

    #[tokio::test]
    async fn line_price_stays_frozen_after_catalog_price_change() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = seed_user(&pool, "early-buyer");
        let category_id = seed_category(&pool, "Fresh");
        let product_id = seed_product(&pool, category_id, "Sea Salt", "30.00", 5);
        seed_cart_item(&pool, user_id, product_id, 1);

        let view = repo.place(user_id, input()).expect("place failed");

        {
            let mut conn = pool.get().unwrap();
            diesel::update(products::table.find(product_id))
                .set(products::price.eq(dec("99.00")))
                .execute(&mut conn)
                .unwrap();
        }

        let reloaded = repo
            .find_scoped(view.order.id, OrderScope::Owner(user_id))
            .expect("find failed")
            .expect("order should exist");
        assert_eq!(reloaded.lines[0].line.unit_price, dec("30.00"));
        assert_eq!(reloaded.order.total_amount, dec("30.00"));
    }

    #[tokio::test]
    async fn two_buyers_racing_for_the_last_unit() {
        let (_container, pool) = setup_db().await;
        let user_a = seed_user(&pool, "racer-a");
        let user_b = seed_user(&pool, "racer-b");
        let category_id = seed_category(&pool, "Limited");
        let product_id = seed_product(&pool, category_id, "Last One", "500.00", 1);
        seed_cart_item(&pool, user_a, product_id, 1);
        seed_cart_item(&pool, user_b, product_id, 1);

        let spawn = |user_id: Uuid| {
            let pool = pool.clone();
            std::thread::spawn(move || {
                DieselOrderRepository::new(pool).place(user_id, input())
            })
        };
        let first = spawn(user_a);
        let second = spawn(user_b);
        let results = [first.join().unwrap(), second.join().unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one of the two placements commits");
        let failure = results
            .iter()
            .find_map(|r| r.as_ref().err())
            .expect("one placement must fail");
        assert!(
            matches!(failure, DomainError::InsufficientStock { available: 0, .. }),
            "loser sees the post-commit remaining stock, got {failure:?}"
        );
        assert_eq!(product_stock(&pool, product_id), 0);
        assert_eq!(order_count(&pool), 1);
    }

    #[tokio::test]
    async fn status_walks_the_transition_graph() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = seed_user(&pool, "status-buyer");
        let category_id = seed_category(&pool, "Green");
        let product_id = seed_product(&pool, category_id, "Fig Leaf", "25.00", 3);
        seed_cart_item(&pool, user_id, product_id, 1);
        let order_id = repo.place(user_id, input()).unwrap().order.id;

        for next in [
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            let order = repo.update_status(order_id, next).expect("transition failed");
            assert_eq!(order.status, next.as_str());
        }
    }

    #[tokio::test]
    async fn invalid_status_jumps_are_rejected() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let user_id = seed_user(&pool, "jump-buyer");
        let category_id = seed_category(&pool, "Dark");
        let product_id = seed_product(&pool, category_id, "Night Oud", "70.00", 3);
        seed_cart_item(&pool, user_id, product_id, 1);
        let order_id = repo.place(user_id, input()).unwrap().order.id;

        let err = repo
            .update_status(order_id, OrderStatus::Delivered)
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Delivered,
            }
        ));

        repo.update_status(order_id, OrderStatus::Cancelled).unwrap();
        let err = repo
            .update_status(order_id, OrderStatus::Pending)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn customers_cannot_see_foreign_orders() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let owner = seed_user(&pool, "order-owner");
        let other = seed_user(&pool, "order-other");
        let category_id = seed_category(&pool, "Clean");
        let product_id = seed_product(&pool, category_id, "White Tea", "40.00", 3);
        seed_cart_item(&pool, owner, product_id, 1);
        let order_id = repo.place(owner, input()).unwrap().order.id;

        assert!(repo
            .find_scoped(order_id, OrderScope::Owner(other))
            .unwrap()
            .is_none());
        assert!(repo
            .find_scoped(order_id, OrderScope::Any)
            .unwrap()
            .is_some());
    }
}
