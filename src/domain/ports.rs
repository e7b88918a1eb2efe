use uuid::Uuid;

use super::cart::CartLine;
use super::catalog::{
    CategoryPatch, CategorySummary, CategoryWithCount, NewCategoryRecord, NewProductRecord,
    ProductFilter, ProductPage, ProductPatch,
};
use super::errors::DomainError;
use super::order::{NewOrderInput, OrderDetail, OrderFilter, OrderPage, OrderScope, OrderView};
use super::status::OrderStatus;
use super::user::NewUserRecord;
use crate::models::category::Category;
use crate::models::order::Order;
use crate::models::product::Product;
use crate::models::user::User;

pub trait UserRepository: Send + Sync + 'static {
    fn create(&self, new_user: NewUserRecord) -> Result<User, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    /// True when either the username or the email is already registered.
    fn identity_taken(&self, username: &str, email: &str) -> Result<bool, DomainError>;
}

pub trait CategoryRepository: Send + Sync + 'static {
    fn list_with_counts(&self) -> Result<Vec<CategoryWithCount>, DomainError>;
    fn find_with_products(&self, id: Uuid) -> Result<Option<(Category, Vec<Product>)>, DomainError>;
    fn create(&self, new: NewCategoryRecord) -> Result<Category, DomainError>;
    fn update(&self, id: Uuid, patch: CategoryPatch) -> Result<Category, DomainError>;
    /// Refuses while any product still references the category.
    fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}

pub trait ProductRepository: Send + Sync + 'static {
    /// Active products only, filtered and paginated.
    fn list(&self, filter: ProductFilter) -> Result<ProductPage, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<(Product, CategorySummary)>, DomainError>;
    fn create(&self, new: NewProductRecord) -> Result<Product, DomainError>;
    fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Product, DomainError>;
    /// Soft delete: clears `is_active`, keeping the row for order history.
    fn deactivate(&self, id: Uuid) -> Result<(), DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    fn load(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError>;
    /// Adds a product, merging into the existing line for the same product.
    /// Returns the updated cart.
    fn add(&self, user_id: Uuid, product_id: Uuid, quantity: i32)
        -> Result<Vec<CartLine>, DomainError>;
    fn set_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32)
        -> Result<CartLine, DomainError>;
    fn remove(&self, user_id: Uuid, item_id: Uuid) -> Result<(), DomainError>;
    /// Clearing an already-empty cart is a no-op.
    fn clear(&self, user_id: Uuid) -> Result<(), DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Runs the checkout flow in one transaction and returns the created
    /// order with its lines.
    fn place(&self, user_id: Uuid, input: NewOrderInput) -> Result<OrderView, DomainError>;
    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError>;
    fn find_scoped(&self, id: Uuid, scope: OrderScope) -> Result<Option<OrderDetail>, DomainError>;
    fn list_all(&self, filter: OrderFilter) -> Result<OrderPage, DomainError>;
    /// Enforces the status transition graph; invalid jumps fail with
    /// `InvalidTransition`.
    fn update_status(&self, id: Uuid, next: OrderStatus) -> Result<Order, DomainError>;
}
