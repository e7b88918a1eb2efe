use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::EmptyCart
            | DomainError::ProductUnavailable { .. }
            | DomainError::InsufficientStock { .. }
            | DomainError::InvalidTransition { .. }
            | DomainError::Validation(_) => AppError::BadRequest(e.to_string()),
            DomainError::InvalidCredentials => AppError::Unauthorized(e.to_string()),
            DomainError::NotFound(_) => AppError::NotFound(e.to_string()),
            DomainError::Conflict(_) => AppError::Conflict(e.to_string()),
            DomainError::Storage(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = |msg: &str| serde_json::json!({ "error": msg });
        match self {
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(body(msg)),
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(body(msg)),
            AppError::Forbidden(msg) => HttpResponse::Forbidden().json(body(msg)),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(body(msg)),
            AppError::Conflict(msg) => HttpResponse::Conflict().json(body(msg)),
            AppError::Internal(msg) => {
                log::error!("internal error: {msg}");
                HttpResponse::InternalServerError().json(body("Internal server error"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    use super::*;
    use crate::domain::status::OrderStatus;

    #[test]
    fn bad_request_returns_400() {
        let resp = AppError::BadRequest("Cart is empty".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthorized_returns_401() {
        let resp = AppError::Unauthorized("no token".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn forbidden_returns_403() {
        let resp = AppError::Forbidden("admins only".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::NotFound("Order not found".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_returns_409() {
        let resp = AppError::Conflict("slug taken".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_error_returns_500() {
        let resp = AppError::Internal("boom".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn insufficient_stock_maps_to_bad_request_with_remaining_count() {
        let app_err: AppError = DomainError::InsufficientStock {
            name: "Amber Noir".to_string(),
            available: 2,
        }
        .into();

        match &app_err {
            AppError::BadRequest(msg) => {
                assert!(msg.contains("Amber Noir"));
                assert!(msg.contains('2'));
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn invalid_transition_maps_to_bad_request_naming_both_states() {
        let app_err: AppError = DomainError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        }
        .into();

        match &app_err {
            AppError::BadRequest(msg) => {
                assert!(msg.contains("delivered"));
                assert!(msg.contains("pending"));
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn invalid_credentials_map_to_unauthorized() {
        let app_err: AppError = DomainError::InvalidCredentials.into();
        assert!(matches!(app_err, AppError::Unauthorized(_)));
    }

    #[test]
    fn storage_maps_to_internal() {
        let app_err: AppError = DomainError::Storage("connection reset".to_string()).into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }
}
