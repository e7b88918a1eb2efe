use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::domain::catalog::{
    CategorySummary, NewProductRecord, ProductFilter, ProductPatch, ProductSort,
};
use crate::errors::AppError;
use crate::models::product::Product;
use crate::AppProductService;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListProductsParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 12, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub category: Option<Uuid>,
    /// Case-insensitive substring match over name and description.
    pub search: Option<String>,
    /// Decimal bound as a string, e.g. "19.99".
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    /// One of: created_at, price, name. Defaults to created_at.
    pub sort_by: Option<String>,
    /// "asc" or "desc". Defaults to desc.
    pub order: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    12
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    pub compare_price: Option<String>,
    pub stock: Option<i32>,
    pub sku: Option<String>,
    pub slug: String,
    pub images: Option<Vec<String>>,
    pub category_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub compare_price: Option<String>,
    pub stock: Option<i32>,
    pub sku: Option<String>,
    pub slug: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategorySummaryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub compare_price: Option<String>,
    pub stock: i32,
    pub sku: Option<String>,
    pub slug: String,
    pub images: Vec<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummaryResponse>,
    pub created_at: String,
}

impl ProductResponse {
    pub fn from_product(product: Product, category: Option<CategorySummary>) -> Self {
        ProductResponse {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price.to_string(),
            compare_price: product.compare_price.map(|p| p.to_string()),
            stock: product.stock,
            sku: product.sku,
            slug: product.slug,
            images: product.images,
            is_active: product.is_active,
            category: category.map(|c| CategorySummaryResponse {
                id: c.id,
                name: c.name,
                slug: c.slug,
            }),
            created_at: product.created_at.to_rfc3339(),
        }
    }
}

fn parse_price(field: &str, value: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(value)
        .map_err(|_| AppError::BadRequest(format!("Invalid {field} '{value}'")))
}

fn parse_filter(params: ListProductsParams) -> Result<ProductFilter, AppError> {
    let sort = match params.sort_by.as_deref() {
        None | Some("created_at") => ProductSort::CreatedAt,
        Some("price") => ProductSort::Price,
        Some("name") => ProductSort::Name,
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Unsupported sort column '{other}'"
            )))
        }
    };
    let descending = match params.order.as_deref() {
        None => true,
        Some(o) if o.eq_ignore_ascii_case("desc") => true,
        Some(o) if o.eq_ignore_ascii_case("asc") => false,
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Unsupported sort order '{other}'"
            )))
        }
    };
    Ok(ProductFilter {
        category_id: params.category,
        search: params.search,
        min_price: params
            .min_price
            .as_deref()
            .map(|v| parse_price("min_price", v))
            .transpose()?,
        max_price: params
            .max_price
            .as_deref()
            .map(|v| parse_price("max_price", v))
            .transpose()?,
        sort,
        descending,
        page: params.page.max(1),
        limit: params.limit.clamp(1, 100),
    })
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 12, max 100)"),
        ("category" = Option<Uuid>, Query, description = "Filter by category id"),
        ("search" = Option<String>, Query, description = "Substring match on name/description"),
        ("min_price" = Option<String>, Query, description = "Lower price bound"),
        ("max_price" = Option<String>, Query, description = "Upper price bound"),
        ("sort_by" = Option<String>, Query, description = "created_at | price | name"),
        ("order" = Option<String>, Query, description = "asc | desc"),
    ),
    responses(
        (status = 200, description = "Paginated list of active products"),
        (status = 400, description = "Invalid filter value"),
    ),
    tag = "products"
)]
pub async fn list_products(
    service: web::Data<AppProductService>,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let filter = parse_filter(query.into_inner())?;
    let page = filter.page;
    let limit = filter.limit;

    let result = web::block(move || service.list(filter))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let products: Vec<ProductResponse> = result
        .items
        .into_iter()
        .map(|(product, category)| ProductResponse::from_product(product, Some(category)))
        .collect();
    let pages = (result.total + limit - 1) / limit;
    Ok(HttpResponse::Ok().json(json!({
        "products": products,
        "pagination": { "total": result.total, "page": page, "pages": pages, "limit": limit },
    })))
}

/// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with category summary", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    service: web::Data<AppProductService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let (product, category) = web::block(move || service.get(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok()
        .json(json!({ "product": ProductResponse::from_product(product, Some(category)) })))
}

/// POST /api/products (admin)
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Missing fields"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Duplicate slug or SKU"),
    ),
    tag = "products"
)]
pub async fn create_product(
    service: web::Data<AppProductService>,
    _admin: AdminUser,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let price = parse_price("price", &body.price)?;
    let compare_price = body
        .compare_price
        .as_deref()
        .map(|v| parse_price("compare_price", v))
        .transpose()?;

    let product = web::block(move || {
        service.create(NewProductRecord {
            name: body.name,
            description: body.description,
            price,
            compare_price,
            stock: body.stock.unwrap_or(0),
            sku: body.sku,
            slug: body.slug,
            images: body.images.unwrap_or_default(),
            category_id: body.category_id,
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(json!({
        "message": "Product created",
        "product": ProductResponse::from_product(product, None),
    })))
}

/// PUT /api/products/{id} (admin)
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Product or category not found"),
    ),
    tag = "products"
)]
pub async fn update_product(
    service: web::Data<AppProductService>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let price = body
        .price
        .as_deref()
        .map(|v| parse_price("price", v))
        .transpose()?;
    let compare_price = body
        .compare_price
        .as_deref()
        .map(|v| parse_price("compare_price", v))
        .transpose()?;

    let product = web::block(move || {
        service.update(
            id,
            ProductPatch {
                name: body.name,
                description: body.description,
                price,
                compare_price,
                stock: body.stock,
                sku: body.sku,
                slug: body.slug,
                images: body.images,
                is_active: body.is_active,
                category_id: body.category_id,
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Product updated",
        "product": ProductResponse::from_product(product, None),
    })))
}

/// DELETE /api/products/{id} (admin) — soft delete.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deactivated"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn delete_product(
    service: web::Data<AppProductService>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    web::block(move || service.deactivate(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": "Product deleted" })))
}
