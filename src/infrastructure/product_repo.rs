use chrono::Utc;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{
    CategorySummary, NewProductRecord, ProductFilter, ProductPage, ProductPatch, ProductSort,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::models::category::Category;
use crate::models::product::{NewProduct, Product, ProductChanges};
use crate::schema::{categories, products};

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn category_summary(category: Category) -> CategorySummary {
    CategorySummary {
        id: category.id,
        name: category.name,
        slug: category.slug,
    }
}

fn category_exists(conn: &mut PgConnection, id: Uuid) -> Result<bool, DomainError> {
    let count: i64 = categories::table
        .filter(categories::id.eq(id))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

impl ProductRepository for DieselProductRepository {
    fn list(&self, filter: ProductFilter) -> Result<ProductPage, DomainError> {
        let mut conn = self.pool.get()?;

        let mut count_query = products::table
            .filter(products::is_active.eq(true))
            .into_boxed();
        if let Some(category_id) = filter.category_id {
            count_query = count_query.filter(products::category_id.eq(category_id));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            count_query = count_query.filter(
                products::name
                    .ilike(pattern.clone())
                    .or(products::description.ilike(pattern).assume_not_null()),
            );
        }
        if let Some(min) = &filter.min_price {
            count_query = count_query.filter(products::price.ge(min.clone()));
        }
        if let Some(max) = &filter.max_price {
            count_query = count_query.filter(products::price.le(max.clone()));
        }
        let total: i64 = count_query.count().get_result(&mut conn)?;

        let mut query = products::table
            .inner_join(categories::table)
            .filter(products::is_active.eq(true))
            .into_boxed();
        if let Some(category_id) = filter.category_id {
            query = query.filter(products::category_id.eq(category_id));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            query = query.filter(
                products::name
                    .ilike(pattern.clone())
                    .or(products::description.ilike(pattern).assume_not_null()),
            );
        }
        if let Some(min) = &filter.min_price {
            query = query.filter(products::price.ge(min.clone()));
        }
        if let Some(max) = &filter.max_price {
            query = query.filter(products::price.le(max.clone()));
        }
        query = match (filter.sort, filter.descending) {
            (ProductSort::CreatedAt, true) => query.order(products::created_at.desc()),
            (ProductSort::CreatedAt, false) => query.order(products::created_at.asc()),
            (ProductSort::Price, true) => query.order(products::price.desc()),
            (ProductSort::Price, false) => query.order(products::price.asc()),
            (ProductSort::Name, true) => query.order(products::name.desc()),
            (ProductSort::Name, false) => query.order(products::name.asc()),
        };

        let offset = (filter.page - 1) * filter.limit;
        let rows: Vec<(Product, Category)> = query
            .limit(filter.limit)
            .offset(offset)
            .select((Product::as_select(), Category::as_select()))
            .load(&mut conn)?;

        Ok(ProductPage {
            items: rows
                .into_iter()
                .map(|(product, category)| (product, category_summary(category)))
                .collect(),
            total,
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<(Product, CategorySummary)>, DomainError> {
        let mut conn = self.pool.get()?;

        let row: Option<(Product, Category)> = products::table
            .inner_join(categories::table)
            .filter(products::id.eq(id))
            .select((Product::as_select(), Category::as_select()))
            .first(&mut conn)
            .optional()?;

        Ok(row.map(|(product, category)| (product, category_summary(category))))
    }

    fn create(&self, new: NewProductRecord) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;

        if !category_exists(&mut conn, new.category_id)? {
            return Err(DomainError::NotFound("Category"));
        }

        diesel::insert_into(products::table)
            .values(&NewProduct {
                id: Uuid::new_v4(),
                name: new.name,
                description: new.description,
                price: new.price,
                compare_price: new.compare_price,
                stock: new.stock,
                sku: new.sku,
                slug: new.slug,
                images: new.images,
                category_id: new.category_id,
            })
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::Conflict(
                        "A product with this slug or SKU already exists".to_string(),
                    )
                }
                other => other.into(),
            })
    }

    fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;

        if let Some(category_id) = patch.category_id {
            if !category_exists(&mut conn, category_id)? {
                return Err(DomainError::NotFound("Category"));
            }
        }

        let changes = ProductChanges {
            name: patch.name,
            description: patch.description,
            price: patch.price,
            compare_price: patch.compare_price,
            stock: patch.stock,
            sku: patch.sku,
            slug: patch.slug,
            images: patch.images,
            is_active: patch.is_active,
            category_id: patch.category_id,
            updated_at: Some(Utc::now()),
        };

        diesel::update(products::table.find(id))
            .set(&changes)
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .optional()?
            .ok_or(DomainError::NotFound("Product"))
    }

    fn deactivate(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(products::table.find(id))
            .set((
                products::is_active.eq(false),
                products::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(DomainError::NotFound("Product"));
        }
        Ok(())
    }
}
