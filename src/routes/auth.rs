use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::error::{ErrorInternalServerError, InternalError};
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, web};

use crate::models::config::ServerConfig;
use crate::routes::error_response;
use crate::services::ServiceError;

/// Extractor guarding write routes with a static bearer token.
///
/// When `api_token` is not configured every request is let through.
#[derive(Debug, Clone, Copy)]
pub struct ApiAuth;

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn authorize(req: &HttpRequest) -> Result<ApiAuth, actix_web::Error> {
    let Some(config) = req.app_data::<web::Data<ServerConfig>>() else {
        log::error!("Server config is not registered as app data");
        return Err(ErrorInternalServerError("missing server config"));
    };

    let expected = match config.api_token.as_deref() {
        Some(token) if !token.is_empty() => token,
        _ => return Ok(ApiAuth),
    };

    if bearer_token(req) == Some(expected) {
        Ok(ApiAuth)
    } else {
        let response = error_response(ServiceError::Unauthorized, "");
        Err(InternalError::from_response("unauthenticated", response).into())
    }
}

impl FromRequest for ApiAuth {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorize(req))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    fn config(api_token: Option<&str>) -> web::Data<ServerConfig> {
        web::Data::new(ServerConfig {
            address: "127.0.0.1".into(),
            port: 0,
            database_url: ":memory:".into(),
            upload_dir: "uploads".into(),
            max_image_kb: 2048,
            api_token: api_token.map(str::to_string),
        })
    }

    #[test]
    fn open_when_no_token_configured() {
        let req = TestRequest::default()
            .app_data(config(None))
            .to_http_request();
        assert!(authorize(&req).is_ok());
    }

    #[test]
    fn accepts_matching_bearer_token() {
        let req = TestRequest::default()
            .app_data(config(Some("secret")))
            .insert_header((header::AUTHORIZATION, "Bearer secret"))
            .to_http_request();
        assert!(authorize(&req).is_ok());
    }

    #[test]
    fn rejects_missing_or_wrong_token() {
        let missing = TestRequest::default()
            .app_data(config(Some("secret")))
            .to_http_request();
        let wrong = TestRequest::default()
            .app_data(config(Some("secret")))
            .insert_header((header::AUTHORIZATION, "Bearer nope"))
            .to_http_request();

        for req in [missing, wrong] {
            let err = authorize(&req).unwrap_err();
            assert_eq!(err.error_response().status(), 401);
        }
    }
}
