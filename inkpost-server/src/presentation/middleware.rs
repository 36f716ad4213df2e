use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use crate::data::user_repository::UserRepository;
use crate::domain::User;
use crate::infrastructure::jwt::JwtService;

/// Name of the HTTP-only cookie carrying the identity token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// The user record resolved from the identity token, attached to request
/// extensions by [`JwtAuth`] and pulled out by handlers via `FromRequest`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<CurrentUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => {
                let response = HttpResponse::Unauthorized().json(
                    serde_json::json!({ "status": 401, "message": "User not authenticated" }),
                );
                ready(Err(actix_web::error::InternalError::from_response(
                    "User not authenticated".to_string(),
                    response,
                )
                .into()))
            }
        }
    }
}

/// Token comes from the session cookie, with an `Authorization: Bearer`
/// fallback for non-browser clients.
fn token_from_request(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.request().cookie(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

/// Short-circuit response for requests that fail authentication.
fn unauthorized_response<B>(req: ServiceRequest, message: &str) -> ServiceResponse<EitherBody<B>> {
    let response = HttpResponse::Unauthorized()
        .json(serde_json::json!({ "status": 401, "message": message }))
        .map_into_right_body();
    req.into_response(response)
}

/// Authentication middleware: verifies the identity token and resolves it to
/// a user record before the handler runs.
pub struct JwtAuth {
    jwt_service: Arc<JwtService>,
    user_repo: Arc<dyn UserRepository>,
}

impl JwtAuth {
    pub fn new(jwt_service: Arc<JwtService>, user_repo: Arc<dyn UserRepository>) -> Self {
        Self {
            jwt_service,
            user_repo,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            jwt_service: self.jwt_service.clone(),
            user_repo: self.user_repo.clone(),
        }))
    }
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    jwt_service: Arc<JwtService>,
    user_repo: Arc<dyn UserRepository>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let jwt_service = self.jwt_service.clone();
        let user_repo = self.user_repo.clone();

        Box::pin(async move {
            let Some(token) = token_from_request(&req) else {
                return Ok(unauthorized_response(req, "Authentication required"));
            };

            let user_id = match jwt_service.verify_token(&token) {
                Ok(user_id) => user_id,
                Err(_) => return Ok(unauthorized_response(req, "Invalid or expired token")),
            };

            let user = match user_repo.find_by_id(user_id).await {
                Ok(user) => user,
                Err(_) => {
                    tracing::warn!("Token for user {} no longer resolves to a record", user_id);
                    return Ok(unauthorized_response(req, "Invalid or expired token"));
                }
            };

            req.extensions_mut().insert(CurrentUser(user));

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn token_is_read_from_bearer_header() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_srv_request();
        assert_eq!(token_from_request(&req).as_deref(), Some("abc.def.ghi"));
    }

    #[actix_web::test]
    async fn cookie_takes_precedence_over_header() {
        let req = TestRequest::default()
            .cookie(actix_web::cookie::Cookie::new(
                ACCESS_TOKEN_COOKIE,
                "cookie-token",
            ))
            .insert_header((header::AUTHORIZATION, "Bearer header-token"))
            .to_srv_request();
        assert_eq!(token_from_request(&req).as_deref(), Some("cookie-token"));
    }

    #[actix_web::test]
    async fn missing_token_yields_none() {
        let req = TestRequest::default().to_srv_request();
        assert!(token_from_request(&req).is_none());
    }
}
