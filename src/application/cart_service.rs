use uuid::Uuid;

use crate::domain::cart::CartLine;
use crate::domain::errors::DomainError;
use crate::domain::ports::CartRepository;

pub struct CartService<R> {
    repo: R,
}

impl<R: CartRepository> CartService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn load(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        self.repo.load(user_id)
    }

    pub fn add(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Vec<CartLine>, DomainError> {
        if quantity < 1 {
            return Err(DomainError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        self.repo.add(user_id, product_id, quantity)
    }

    pub fn set_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        if quantity < 1 {
            return Err(DomainError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }
        self.repo.set_quantity(user_id, item_id, quantity)
    }

    pub fn remove(&self, user_id: Uuid, item_id: Uuid) -> Result<(), DomainError> {
        self.repo.remove(user_id, item_id)
    }

    pub fn clear(&self, user_id: Uuid) -> Result<(), DomainError> {
        self.repo.clear(user_id)
    }
}
