use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrderInput, OrderDetail, OrderFilter, OrderPage, OrderScope, OrderView};
use crate::domain::ports::OrderRepository;
use crate::domain::status::OrderStatus;
use crate::models::order::Order;

pub struct OrderService<R> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn place(&self, user_id: Uuid, input: NewOrderInput) -> Result<OrderView, DomainError> {
        if input.shipping_address.trim().is_empty() {
            return Err(DomainError::Validation(
                "Shipping address is required".to_string(),
            ));
        }
        self.repo.place(user_id, input)
    }

    pub fn my_orders(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        self.repo.list_for_user(user_id)
    }

    pub fn get(&self, id: Uuid, scope: OrderScope) -> Result<OrderDetail, DomainError> {
        self.repo
            .find_scoped(id, scope)?
            .ok_or(DomainError::NotFound("Order"))
    }

    pub fn list_all(&self, filter: OrderFilter) -> Result<OrderPage, DomainError> {
        self.repo.list_all(filter)
    }

    pub fn update_status(&self, id: Uuid, next: OrderStatus) -> Result<Order, DomainError> {
        self.repo.update_status(id, next)
    }
}
