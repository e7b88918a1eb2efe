use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::domain::catalog::{CategoryPatch, NewCategoryRecord};
use crate::errors::AppError;
use crate::handlers::products::ProductResponse;
use crate::models::category::Category;
use crate::AppCategoryService;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub image: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_count: Option<i64>,
}

fn category_response(category: Category, product_count: Option<i64>) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        name: category.name,
        description: category.description,
        slug: category.slug,
        image: category.image,
        created_at: category.created_at.to_rfc3339(),
        product_count,
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories with their product counts"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    service: web::Data<AppCategoryService>,
) -> Result<HttpResponse, AppError> {
    let rows = web::block(move || service.list())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let categories: Vec<CategoryResponse> = rows
        .into_iter()
        .map(|row| category_response(row.category, Some(row.product_count)))
        .collect();
    Ok(HttpResponse::Ok().json(json!({ "categories": categories })))
}

/// GET /api/categories/{id}
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category with its active products"),
        (status = 404, description = "Category not found"),
    ),
    tag = "categories"
)]
pub async fn get_category(
    service: web::Data<AppCategoryService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let (category, products) = web::block(move || service.get(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let products: Vec<ProductResponse> = products
        .into_iter()
        .map(|p| ProductResponse::from_product(p, None))
        .collect();
    Ok(HttpResponse::Ok().json(json!({
        "category": category_response(category, Some(products.len() as i64)),
        "products": products,
    })))
}

/// POST /api/categories (admin)
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Missing fields or duplicate name/slug"),
        (status = 403, description = "Admin privileges required"),
    ),
    tag = "categories"
)]
pub async fn create_category(
    service: web::Data<AppCategoryService>,
    _admin: AdminUser,
    body: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let category = web::block(move || {
        service.create(NewCategoryRecord {
            name: body.name,
            description: body.description,
            slug: body.slug,
            image: body.image,
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(json!({
        "message": "Category created successfully",
        "category": category_response(category, None),
    })))
}

/// PUT /api/categories/{id} (admin)
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Duplicate name/slug"),
        (status = 404, description = "Category not found"),
    ),
    tag = "categories"
)]
pub async fn update_category(
    service: web::Data<AppCategoryService>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();

    let category = web::block(move || {
        service.update(
            id,
            CategoryPatch {
                name: body.name,
                description: body.description,
                slug: body.slug,
                image: body.image,
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Category updated successfully",
        "category": category_response(category, None),
    })))
}

/// DELETE /api/categories/{id} (admin)
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 400, description = "Category still has products"),
        (status = 404, description = "Category not found"),
    ),
    tag = "categories"
)]
pub async fn delete_category(
    service: web::Data<AppCategoryService>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    web::block(move || service.delete(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": "Category deleted successfully" })))
}
