use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::models::category::Category;
use crate::models::product::Product;

/// Category fields embedded in product listings.
#[derive(Debug, Clone)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct CategoryWithCount {
    pub category: Category,
    pub product_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewCategoryRecord {
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProductRecord {
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

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    CreatedAt,
    Price,
    Name,
}

/// Listing filter. `page` is 1-based; `limit` is already clamped by the
/// HTTP layer.
#[derive(Debug, Clone)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub sort: ProductSort,
    pub descending: bool,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug)]
pub struct ProductPage {
    pub items: Vec<(Product, CategorySummary)>,
    pub total: i64,
}
