use uuid::Uuid;

use super::status::OrderStatus;
use crate::models::order::Order;
use crate::models::order_line::OrderLine;

/// Product fields embedded in order line views.
#[derive(Debug, Clone)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub images: Vec<String>,
}

/// User fields embedded in admin/detail order views.
#[derive(Debug, Clone)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub line: OrderLine,
    pub product: ProductSummary,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub order: Order,
    pub lines: Vec<OrderLineView>,
}

#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLineView>,
    pub user: UserSummary,
}

/// Visibility of a single order: admins see any, customers only their own.
#[derive(Debug, Clone, Copy)]
pub enum OrderScope {
    Any,
    Owner(Uuid),
}

#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug)]
pub struct OrderPage {
    pub items: Vec<OrderDetail>,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct NewOrderInput {
    pub shipping_address: String,
    pub payment_method: String,
    pub notes: Option<String>,
}
