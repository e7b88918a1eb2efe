use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::cart::{cart_total, CartLine};
use crate::errors::AppError;
use crate::AppCartService;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    /// Defaults to 1.
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartProductResponse {
    pub id: Uuid,
    pub name: String,
    pub price: String,
    pub images: Vec<String>,
    pub stock: i32,
    pub is_active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub product: CartProductResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub cart_items: Vec<CartItemResponse>,
    pub total: String,
    pub items_count: usize,
}

fn item_response(line: CartLine) -> CartItemResponse {
    CartItemResponse {
        id: line.item.id,
        product_id: line.item.product_id,
        quantity: line.item.quantity,
        product: CartProductResponse {
            id: line.product.id,
            name: line.product.name,
            price: line.product.price.to_string(),
            images: line.product.images,
            stock: line.product.stock,
            is_active: line.product.is_active,
        },
    }
}

fn cart_response(lines: Vec<CartLine>) -> CartResponse {
    let total = cart_total(&lines).to_string();
    let items_count = lines.len();
    CartResponse {
        cart_items: lines.into_iter().map(item_response).collect(),
        total,
        items_count,
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/cart
#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "The caller's cart with its running total", body = CartResponse),
        (status = 401, description = "Missing token"),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    service: web::Data<AppCartService>,
    auth: AuthUser,
) -> Result<HttpResponse, AppError> {
    let lines = web::block(move || service.load(auth.id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(cart_response(lines)))
}

/// POST /api/cart
#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Product added, updated cart returned", body = CartResponse),
        (status = 400, description = "Requested quantity exceeds stock"),
        (status = 404, description = "Product unknown or inactive"),
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    service: web::Data<AppCartService>,
    auth: AuthUser,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let lines = web::block(move || service.add(auth.id, body.product_id, body.quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let cart = cart_response(lines);
    Ok(HttpResponse::Ok().json(json!({
        "message": "Product added to cart",
        "cart_items": cart.cart_items,
        "total": cart.total,
        "items_count": cart.items_count,
    })))
}

/// PUT /api/cart/{id}
#[utoipa::path(
    put,
    path = "/api/cart/{id}",
    params(("id" = Uuid, Path, description = "Cart item id")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = CartItemResponse),
        (status = 400, description = "Quantity below 1 or exceeds stock"),
        (status = 404, description = "Cart item not found"),
    ),
    tag = "cart"
)]
pub async fn update_cart_item(
    service: web::Data<AppCartService>,
    auth: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();
    let quantity = body.into_inner().quantity;

    let line = web::block(move || service.set_quantity(auth.id, item_id, quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Quantity updated",
        "cart_item": item_response(line),
    })))
}

/// DELETE /api/cart/{id}
#[utoipa::path(
    delete,
    path = "/api/cart/{id}",
    params(("id" = Uuid, Path, description = "Cart item id")),
    responses(
        (status = 200, description = "Item removed"),
        (status = 404, description = "Cart item not found"),
    ),
    tag = "cart"
)]
pub async fn remove_cart_item(
    service: web::Data<AppCartService>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let item_id = path.into_inner();

    web::block(move || service.remove(auth.id, item_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": "Product removed from cart" })))
}

/// DELETE /api/cart — clearing an empty cart is a no-op success.
#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart cleared"),
        (status = 401, description = "Missing token"),
    ),
    tag = "cart"
)]
pub async fn clear_cart(
    service: web::Data<AppCartService>,
    auth: AuthUser,
) -> Result<HttpResponse, AppError> {
    web::block(move || service.clear(auth.id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "message": "Cart cleared" })))
}
