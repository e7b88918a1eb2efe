use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::products;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = products)]
#[diesel(belongs_to(crate::models::category::Category))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub compare_price: Option<BigDecimal>,
    pub stock: i32,
    pub sku: Option<String>,
    pub slug: String,
    pub images: Vec<String>,
    pub is_active: bool,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub compare_price: Option<BigDecimal>,
    pub stock: i32,
    pub sku: Option<String>,
    pub slug: String,
    pub images: Vec<String>,
    pub category_id: Uuid,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = products)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub compare_price: Option<BigDecimal>,
    pub stock: Option<i32>,
    pub sku: Option<String>,
    pub slug: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub category_id: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}
