use uuid::Uuid;

use crate::domain::catalog::{
    CategorySummary, NewProductRecord, ProductFilter, ProductPage, ProductPatch,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::models::product::Product;

pub struct ProductService<R> {
    repo: R,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self, filter: ProductFilter) -> Result<ProductPage, DomainError> {
        self.repo.list(filter)
    }

    pub fn get(&self, id: Uuid) -> Result<(Product, CategorySummary), DomainError> {
        self.repo.find_by_id(id)?.ok_or(DomainError::NotFound("Product"))
    }

    pub fn create(&self, new: NewProductRecord) -> Result<Product, DomainError> {
        if new.name.trim().is_empty() || new.slug.trim().is_empty() {
            return Err(DomainError::Validation(
                "Name, price, slug and category are required".to_string(),
            ));
        }
        self.repo.create(new)
    }

    pub fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Product, DomainError> {
        self.repo.update(id, patch)
    }

    pub fn deactivate(&self, id: Uuid) -> Result<(), DomainError> {
        self.repo.deactivate(id)
    }
}
