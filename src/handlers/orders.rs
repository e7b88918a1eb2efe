use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AdminUser, AuthUser};
use crate::domain::order::{NewOrderInput, OrderDetail, OrderFilter, OrderScope, OrderView};
use crate::domain::status::OrderStatus;
use crate::errors::AppError;
use crate::models::order::Order;
use crate::AppOrderService;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    /// Defaults to "cash".
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub status: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderProductResponse {
    pub id: Uuid,
    pub name: String,
    pub images: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Frozen price at order time.
    pub unit_price: String,
    pub product: OrderProductResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderUserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub total_amount: String,
    pub shipping_address: String,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub lines: Vec<OrderLineResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<OrderUserResponse>,
}

fn order_core(order: Order, lines: Vec<OrderLineResponse>) -> OrderResponse {
    OrderResponse {
        id: order.id,
        order_number: order.order_number,
        user_id: order.user_id,
        status: order.status,
        total_amount: order.total_amount.to_string(),
        shipping_address: order.shipping_address,
        payment_method: order.payment_method,
        notes: order.notes,
        created_at: order.created_at.to_rfc3339(),
        lines,
        user: None,
    }
}

fn line_responses(lines: Vec<crate::domain::order::OrderLineView>) -> Vec<OrderLineResponse> {
    lines
        .into_iter()
        .map(|view| OrderLineResponse {
            id: view.line.id,
            product_id: view.line.product_id,
            quantity: view.line.quantity,
            unit_price: view.line.unit_price.to_string(),
            product: OrderProductResponse {
                id: view.product.id,
                name: view.product.name,
                images: view.product.images,
            },
        })
        .collect()
}

fn view_response(view: OrderView) -> OrderResponse {
    let lines = line_responses(view.lines);
    order_core(view.order, lines)
}

fn detail_response(detail: OrderDetail) -> OrderResponse {
    let lines = line_responses(detail.lines);
    let mut response = order_core(detail.order, lines);
    response.user = Some(OrderUserResponse {
        id: detail.user.id,
        username: detail.user.username,
        email: detail.user.email,
        phone: detail.user.phone,
    });
    response
}

fn parse_status(value: &str) -> Result<OrderStatus, AppError> {
    value
        .parse::<OrderStatus>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/orders
///
/// Converts the caller's cart into an order inside a single transaction:
/// validates every line, freezes unit prices, decrements stock, and clears
/// the cart. Any failure rolls the whole operation back.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Empty cart, unavailable product, or insufficient stock"),
        (status = 401, description = "Missing token"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<AppOrderService>,
    auth: AuthUser,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let input = NewOrderInput {
        shipping_address: body.shipping_address,
        payment_method: body.payment_method.unwrap_or_else(|| "cash".to_string()),
        notes: body.notes,
    };

    let view = web::block(move || service.place(auth.id, input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(json!({
        "message": "Order created",
        "order": view_response(view),
    })))
}

/// GET /api/orders/my-orders
#[utoipa::path(
    get,
    path = "/api/orders/my-orders",
    responses(
        (status = 200, description = "The caller's orders, newest first"),
        (status = 401, description = "Missing token"),
    ),
    tag = "orders"
)]
pub async fn my_orders(
    service: web::Data<AppOrderService>,
    auth: AuthUser,
) -> Result<HttpResponse, AppError> {
    let views = web::block(move || service.my_orders(auth.id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let orders: Vec<OrderResponse> = views.into_iter().map(view_response).collect();
    Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

/// GET /api/orders/{id}
///
/// Customers see only their own orders; a foreign id answers 404 so order
/// existence is not leaked. Admins see any order.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with lines and owner contact", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<AppOrderService>,
    auth: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let scope = if auth.is_admin() {
        OrderScope::Any
    } else {
        OrderScope::Owner(auth.id)
    };

    let detail = web::block(move || service.get(id, scope))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({ "order": detail_response(detail) })))
}

/// GET /api/orders (admin)
#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("status" = Option<String>, Query, description = "Filter by lifecycle status"),
    ),
    responses(
        (status = 200, description = "Paginated list of all orders"),
        (status = 400, description = "Unknown status value"),
        (status = 403, description = "Admin privileges required"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<AppOrderService>,
    _admin: AdminUser,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let status = params.status.as_deref().map(parse_status).transpose()?;
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || {
        service.list_all(OrderFilter {
            status,
            page,
            limit,
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let orders: Vec<OrderResponse> = result.items.into_iter().map(detail_response).collect();
    let pages = (result.total + limit - 1) / limit;
    Ok(HttpResponse::Ok().json(json!({
        "orders": orders,
        "pagination": { "total": result.total, "page": page, "pages": pages, "limit": limit },
    })))
}

/// PUT /api/orders/{id}/status (admin)
///
/// Enforces the transition graph; invalid jumps answer 400.
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unknown status or invalid transition"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    service: web::Data<AppOrderService>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let next = parse_status(&body.into_inner().status)?;

    let order = web::block(move || service.update_status(id, next))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Order status updated",
        "order": order_core(order, vec![]),
    })))
}
