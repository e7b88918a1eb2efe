use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::user::{NewUserRecord, Role};
use crate::models::user::{NewUser, User};
use crate::schema::users;

pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for DieselUserRepository {
    fn create(&self, new_user: NewUserRecord) -> Result<User, DomainError> {
        let mut conn = self.pool.get()?;

        let row = NewUser {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: Role::Customer.as_str().to_string(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone: new_user.phone,
        };

        diesel::insert_into(users::table)
            .values(&row)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match e {
                // Backstop for the race between the taken-check and the insert.
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::Validation("Username or email already in use".to_string())
                }
                other => other.into(),
            })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let mut conn = self.pool.get()?;

        Ok(users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?)
    }

    fn identity_taken(&self, username: &str, email: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let count: i64 = users::table
            .filter(users::username.eq(username).or(users::email.eq(email)))
            .count()
            .get_result(&mut conn)?;
        Ok(count > 0)
    }
}
