use std::collections::HashMap;

use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{CategoryPatch, CategoryWithCount, NewCategoryRecord};
use crate::domain::errors::DomainError;
use crate::domain::ports::CategoryRepository;
use crate::models::category::{Category, CategoryChanges, NewCategory};
use crate::models::product::Product;
use crate::schema::{categories, products};

pub struct DieselCategoryRepository {
    pool: DbPool,
}

impl DieselCategoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn duplicate_category(e: diesel::result::Error) -> DomainError {
    match e {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            DomainError::Validation("A category with this name or slug already exists".to_string())
        }
        other => other.into(),
    }
}

impl CategoryRepository for DieselCategoryRepository {
    fn list_with_counts(&self) -> Result<Vec<CategoryWithCount>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows: Vec<Category> = categories::table
            .order(categories::name.asc())
            .select(Category::as_select())
            .load(&mut conn)?;

        let counts: Vec<(Uuid, i64)> = products::table
            .group_by(products::category_id)
            .select((products::category_id, count_star()))
            .load(&mut conn)?;
        let counts: HashMap<Uuid, i64> = counts.into_iter().collect();

        Ok(rows
            .into_iter()
            .map(|category| CategoryWithCount {
                product_count: counts.get(&category.id).copied().unwrap_or(0),
                category,
            })
            .collect())
    }

    fn find_with_products(
        &self,
        id: Uuid,
    ) -> Result<Option<(Category, Vec<Product>)>, DomainError> {
        let mut conn = self.pool.get()?;

        let category = categories::table
            .find(id)
            .select(Category::as_select())
            .first(&mut conn)
            .optional()?;
        let Some(category) = category else {
            return Ok(None);
        };

        let items: Vec<Product> = products::table
            .filter(products::category_id.eq(category.id))
            .filter(products::is_active.eq(true))
            .order(products::name.asc())
            .select(Product::as_select())
            .load(&mut conn)?;

        Ok(Some((category, items)))
    }

    fn create(&self, new: NewCategoryRecord) -> Result<Category, DomainError> {
        let mut conn = self.pool.get()?;

        diesel::insert_into(categories::table)
            .values(&NewCategory {
                id: Uuid::new_v4(),
                name: new.name,
                description: new.description,
                slug: new.slug,
                image: new.image,
            })
            .returning(Category::as_returning())
            .get_result(&mut conn)
            .map_err(duplicate_category)
    }

    fn update(&self, id: Uuid, patch: CategoryPatch) -> Result<Category, DomainError> {
        let mut conn = self.pool.get()?;

        let changes = CategoryChanges {
            name: patch.name,
            description: patch.description,
            slug: patch.slug,
            image: patch.image,
            updated_at: Some(Utc::now()),
        };

        diesel::update(categories::table.find(id))
            .set(&changes)
            .returning(Category::as_returning())
            .get_result(&mut conn)
            .optional()
            .map_err(duplicate_category)?
            .ok_or(DomainError::NotFound("Category"))
    }

    fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let exists: i64 = categories::table
                .filter(categories::id.eq(id))
                .count()
                .get_result(conn)?;
            if exists == 0 {
                return Err(DomainError::NotFound("Category"));
            }

            let product_count: i64 = products::table
                .filter(products::category_id.eq(id))
                .count()
                .get_result(conn)?;
            if product_count > 0 {
                return Err(DomainError::Validation(format!(
                    "Cannot delete category with {product_count} associated products"
                )));
            }

            diesel::delete(categories::table.find(id)).execute(conn)?;
            Ok(())
        })
    }
}
