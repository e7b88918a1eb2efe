use uuid::Uuid;

use crate::domain::catalog::{CategoryPatch, CategoryWithCount, NewCategoryRecord};
use crate::domain::errors::DomainError;
use crate::domain::ports::CategoryRepository;
use crate::models::category::Category;
use crate::models::product::Product;

pub struct CategoryService<R> {
    repo: R,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self) -> Result<Vec<CategoryWithCount>, DomainError> {
        self.repo.list_with_counts()
    }

    pub fn get(&self, id: Uuid) -> Result<(Category, Vec<Product>), DomainError> {
        self.repo
            .find_with_products(id)?
            .ok_or(DomainError::NotFound("Category"))
    }

    pub fn create(&self, new: NewCategoryRecord) -> Result<Category, DomainError> {
        if new.name.trim().is_empty() || new.slug.trim().is_empty() {
            return Err(DomainError::Validation(
                "Name and slug are required".to_string(),
            ));
        }
        self.repo.create(new)
    }

    pub fn update(&self, id: Uuid, patch: CategoryPatch) -> Result<Category, DomainError> {
        self.repo.update(id, patch)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.repo.delete(id)
    }
}
