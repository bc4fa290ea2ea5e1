use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use sqlx::PgPool;

use crate::auth::extractors::CurrentUser;
use crate::auth::token::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::models::User;

/// Request-level auth gate.
///
/// Verifies the bearer token, then resolves the user whose stored token list
/// still contains the exact presented token. A token removed by logout fails
/// the lookup even though its signature would still verify.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

/// Routes reachable without a token: registration, login, the health probe,
/// and the binary image reads.
fn is_public(method: &Method, path: &str) -> bool {
    if *method == Method::POST {
        return path == "/users" || path == "/users/login";
    }
    if *method == Method::GET {
        return path == "/health"
            || (path.starts_with("/users/") && path.ends_with("/avatar"))
            || (path.starts_with("/tasks/") && path.ends_with("/image"));
    }
    false
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_public(req.method(), req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let current = authenticate(&req).await?;
            req.extensions_mut().insert(current);
            service.call(req).await
        })
    }
}

async fn authenticate(req: &ServiceRequest) -> Result<CurrentUser, AppError> {
    let config = req
        .app_data::<web::Data<Config>>()
        .ok_or_else(|| AppError::InternalServerError("Configuration not available".into()))?;
    let pool = req
        .app_data::<web::Data<PgPool>>()
        .ok_or_else(|| AppError::InternalServerError("Database pool not available".into()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Please authenticate.".into()))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Please authenticate.".into()))?;

    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, age, created_at, updated_at \
         FROM users WHERE id = $1 AND $2 = ANY(tokens)",
    )
    .bind(claims.sub)
    .bind(token)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::Unauthorized("Please authenticate.".into()))?;

    Ok(CurrentUser {
        user,
        token: token.to_string(),
    })
}
