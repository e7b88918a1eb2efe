use uuid::Uuid;

use crate::auth::password;
use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::user::NewUserRecord;
use crate::models::user::User;

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

pub struct AuthService<R> {
    users: R,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(users: R) -> Self {
        Self { users }
    }

    pub fn register(&self, input: RegisterInput) -> Result<User, DomainError> {
        if input.username.trim().is_empty()
            || input.email.trim().is_empty()
            || input.password.is_empty()
        {
            return Err(DomainError::Validation(
                "Username, email and password are required".to_string(),
            ));
        }
        if self.users.identity_taken(&input.username, &input.email)? {
            return Err(DomainError::Validation(
                "Username or email already in use".to_string(),
            ));
        }

        let password_hash = password::hash_password(&input.password)
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        self.users.create(NewUserRecord {
            username: input.username,
            email: input.email,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
        })
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub fn login(&self, email: &str, password_input: &str) -> Result<User, DomainError> {
        let user = self
            .users
            .find_by_email(email)?
            .ok_or(DomainError::InvalidCredentials)?;

        let valid = password::verify_password(password_input, &user.password_hash)
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        if !valid {
            return Err(DomainError::InvalidCredentials);
        }
        Ok(user)
    }

    pub fn current_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.users.find_by_id(id)?.ok_or(DomainError::NotFound("User"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    struct InMemoryUsers {
        rows: Mutex<Vec<User>>,
    }

    impl UserRepository for InMemoryUsers {
        fn create(&self, new_user: NewUserRecord) -> Result<User, DomainError> {
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                username: new_user.username,
                email: new_user.email,
                password_hash: new_user.password_hash,
                role: "customer".to_string(),
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                phone: new_user.phone,
                created_at: now,
                updated_at: now,
            };
            self.rows.lock().unwrap().push(user.clone());
            Ok(user)
        }

        fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
            Ok(self.rows.lock().unwrap().iter().find(|u| u.id == id).cloned())
        }

        fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        fn identity_taken(&self, username: &str, email: &str) -> Result<bool, DomainError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .any(|u| u.username == username || u.email == email))
        }
    }

    fn register_input(username: &str, email: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: email.to_string(),
            password: "hunter2hunter2".to_string(),
            first_name: None,
            last_name: None,
            phone: None,
        }
    }

    #[test]
    fn register_stores_a_hash_not_the_password() {
        let service = AuthService::new(InMemoryUsers::default());

        let user = service
            .register(register_input("alice", "alice@example.com"))
            .expect("register failed");

        assert_ne!(user.password_hash, "hunter2hunter2");
        assert!(
            crate::auth::password::verify_password("hunter2hunter2", &user.password_hash).unwrap()
        );
    }

    #[test]
    fn register_rejects_taken_username_or_email() {
        let service = AuthService::new(InMemoryUsers::default());
        service
            .register(register_input("bob", "bob@example.com"))
            .unwrap();

        let err = service
            .register(register_input("bob", "other@example.com"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = service
            .register(register_input("other", "bob@example.com"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn register_requires_username_email_and_password() {
        let service = AuthService::new(InMemoryUsers::default());

        let err = service
            .register(RegisterInput {
                password: String::new(),
                ..register_input("carol", "carol@example.com")
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn login_succeeds_with_the_right_password() {
        let service = AuthService::new(InMemoryUsers::default());
        service
            .register(register_input("dave", "dave@example.com"))
            .unwrap();

        let user = service
            .login("dave@example.com", "hunter2hunter2")
            .expect("login failed");

        assert_eq!(user.username, "dave");
    }

    #[test]
    fn login_failures_are_indistinguishable() {
        let service = AuthService::new(InMemoryUsers::default());
        service
            .register(register_input("erin", "erin@example.com"))
            .unwrap();

        let wrong_password = service
            .login("erin@example.com", "not-the-password")
            .unwrap_err();
        let unknown_email = service
            .login("nobody@example.com", "hunter2hunter2")
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, DomainError::InvalidCredentials));
    }
}
