use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use uuid::Uuid;

use super::token::{self, JwtConfig};
use crate::domain::user::Role;
use crate::errors::AppError;

/// The authenticated caller, decoded from the bearer token. Carries only
/// what the token proves; handlers needing the full record load it.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An [`AuthUser`] whose role is admin; extraction fails with 403 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthUser);

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Access token is missing".to_string()))?;

    let config = req
        .app_data::<web::Data<JwtConfig>>()
        .ok_or_else(|| AppError::Internal("JWT config is not registered".to_string()))?;

    let claims =
        token::verify(config.get_ref(), token).map_err(|e| AppError::Forbidden(e.to_string()))?;

    let id = claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AppError::Forbidden("Invalid access token".to_string()))?;
    let role = claims
        .role
        .parse::<Role>()
        .map_err(|_| AppError::Forbidden("Invalid access token".to_string()))?;

    Ok(AuthUser { id, role })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).and_then(|user| {
            if user.is_admin() {
                Ok(AdminUser(user))
            } else {
                Err(AppError::Forbidden("Admin privileges required".to_string()))
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    fn config() -> web::Data<JwtConfig> {
        web::Data::new(JwtConfig {
            secret: "extractor-test-secret-32-bytes-xx".to_string(),
            expiration_hours: 1,
        })
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let req = TestRequest::default().app_data(config()).to_http_request();

        let err = authenticate(&req).unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[actix_web::test]
    async fn valid_bearer_token_authenticates() {
        let cfg = config();
        let user_id = Uuid::new_v4();
        let token = token::issue(cfg.get_ref(), user_id, Role::Admin).unwrap();
        let req = TestRequest::default()
            .app_data(cfg)
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_http_request();

        let user = authenticate(&req).unwrap();

        assert_eq!(user.id, user_id);
        assert!(user.is_admin());
    }

    #[actix_web::test]
    async fn mangled_token_is_forbidden() {
        let req = TestRequest::default()
            .app_data(config())
            .insert_header((header::AUTHORIZATION, "Bearer not.a.token"))
            .to_http_request();

        let err = authenticate(&req).unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
