use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{CartLine, CartProductSummary};
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;
use crate::models::cart_item::{CartItem, NewCartItem};
use crate::models::product::Product;
use crate::schema::{cart_items, products};

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_line(item: CartItem, product: Product) -> CartLine {
    CartLine {
        item,
        product: CartProductSummary {
            id: product.id,
            name: product.name,
            price: product.price,
            images: product.images,
            stock: product.stock,
            is_active: product.is_active,
        },
    }
}

impl CartRepository for DieselCartRepository {
    fn load(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows: Vec<(CartItem, Product)> = cart_items::table
            .inner_join(products::table)
            .filter(cart_items::user_id.eq(user_id))
            .order(cart_items::created_at.asc())
            .select((CartItem::as_select(), Product::as_select()))
            .load(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(item, product)| to_line(item, product))
            .collect())
    }

    fn add(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Vec<CartLine>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let product: Option<Product> = products::table
                .find(product_id)
                .select(Product::as_select())
                .first(conn)
                .optional()?;
            let product = match product {
                Some(p) if p.is_active => p,
                _ => return Err(DomainError::NotFound("Product")),
            };

            if product.stock < quantity {
                return Err(DomainError::InsufficientStock {
                    name: product.name,
                    available: product.stock,
                });
            }

            let existing: Option<CartItem> = cart_items::table
                .filter(cart_items::user_id.eq(user_id))
                .filter(cart_items::product_id.eq(product_id))
                .select(CartItem::as_select())
                .first(conn)
                .optional()?;

            match existing {
                // One line per (user, product): merge into the existing line.
                Some(item) => {
                    let merged = item.quantity + quantity;
                    if product.stock < merged {
                        return Err(DomainError::InsufficientStock {
                            name: product.name,
                            available: product.stock,
                        });
                    }
                    diesel::update(cart_items::table.find(item.id))
                        .set((
                            cart_items::quantity.eq(merged),
                            cart_items::updated_at.eq(Utc::now()),
                        ))
                        .execute(conn)?;
                }
                None => {
                    diesel::insert_into(cart_items::table)
                        .values(&NewCartItem {
                            id: Uuid::new_v4(),
                            user_id,
                            product_id,
                            quantity,
                        })
                        .execute(conn)?;
                }
            }
            Ok(())
        })?;

        self.load(user_id)
    }

    fn set_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let row: Option<(CartItem, Product)> = cart_items::table
                .inner_join(products::table)
                .filter(cart_items::id.eq(item_id))
                .filter(cart_items::user_id.eq(user_id))
                .select((CartItem::as_select(), Product::as_select()))
                .first(conn)
                .optional()?;
            let Some((item, product)) = row else {
                return Err(DomainError::NotFound("Cart item"));
            };

            if product.stock < quantity {
                return Err(DomainError::InsufficientStock {
                    name: product.name,
                    available: product.stock,
                });
            }

            let item = diesel::update(cart_items::table.find(item.id))
                .set((
                    cart_items::quantity.eq(quantity),
                    cart_items::updated_at.eq(Utc::now()),
                ))
                .returning(CartItem::as_returning())
                .get_result(conn)?;

            Ok(to_line(item, product))
        })
    }

    fn remove(&self, user_id: Uuid, item_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(
            cart_items::table
                .filter(cart_items::id.eq(item_id))
                .filter(cart_items::user_id.eq(user_id)),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(DomainError::NotFound("Cart item"));
        }
        Ok(())
    }

    fn clear(&self, user_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id)))
            .execute(&mut conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::CartRepository;
    use crate::infrastructure::test_support::{
        cart_len, deactivate_product, seed_category, seed_product, seed_user, setup_db,
    };

    #[tokio::test]
    async fn add_merges_into_existing_line() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCartRepository::new(pool.clone());
        let user_id = seed_user(&pool, "merge-user");
        let category_id = seed_category(&pool, "Woody");
        let product_id = seed_product(&pool, category_id, "Cedar Mist", "45.00", 10);

        repo.add(user_id, product_id, 2).expect("first add failed");
        let cart = repo.add(user_id, product_id, 3).expect("second add failed");

        assert_eq!(cart.len(), 1, "one line per (user, product)");
        assert_eq!(cart[0].item.quantity, 5);
    }

    #[tokio::test]
    async fn add_rejects_more_than_stock_naming_remaining() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCartRepository::new(pool.clone());
        let user_id = seed_user(&pool, "stock-user");
        let category_id = seed_category(&pool, "Citrus");
        let product_id = seed_product(&pool, category_id, "Lime Soda", "12.00", 2);

        let err = repo.add(user_id, product_id, 3).unwrap_err();

        match err {
            DomainError::InsufficientStock { available, .. } => assert_eq!(available, 2),
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(cart_len(&pool, user_id), 0);
    }

    #[tokio::test]
    async fn add_rejects_inactive_product() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCartRepository::new(pool.clone());
        let user_id = seed_user(&pool, "inactive-user");
        let category_id = seed_category(&pool, "Floral");
        let product_id = seed_product(&pool, category_id, "Rose Veil", "80.00", 5);
        deactivate_product(&pool, product_id);

        let err = repo.add(user_id, product_id, 1).unwrap_err();

        assert!(matches!(err, DomainError::NotFound("Product")));
    }

    #[tokio::test]
    async fn clearing_an_empty_cart_is_a_noop() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCartRepository::new(pool.clone());
        let user_id = seed_user(&pool, "clear-user");

        repo.clear(user_id).expect("first clear failed");
        repo.clear(user_id).expect("second clear failed");

        assert_eq!(cart_len(&pool, user_id), 0);
    }

    #[tokio::test]
    async fn remove_is_scoped_to_the_owner() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCartRepository::new(pool.clone());
        let owner = seed_user(&pool, "owner");
        let intruder = seed_user(&pool, "intruder");
        let category_id = seed_category(&pool, "Spice");
        let product_id = seed_product(&pool, category_id, "Clove Oud", "95.00", 5);

        let cart = repo.add(owner, product_id, 1).unwrap();
        let item_id = cart[0].item.id;

        let err = repo.remove(intruder, item_id).unwrap_err();
        assert!(matches!(err, DomainError::NotFound("Cart item")));

        repo.remove(owner, item_id).expect("owner remove failed");
        assert_eq!(cart_len(&pool, owner), 0);
    }
}
