//! Bearer-token auth extractor.
//!
//! Token *issuance* (register/login) is an external collaborator per §1 —
//! only verification lives here, split into an `Auth` extractor and a
//! `Claims` payload trimmed to the one claim the coordinator needs: the
//! caller's user id.
use actix_web::dev::Payload;
use actix_web::web;
use actix_web::FromRequest;
use actix_web::HttpRequest;
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;

#[derive(Debug, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[allow(dead_code)]
    pub exp: i64,
}

/// Decodes a bearer token into the caller's user id, or `None` on any
/// failure. Shared by the `Auth` extractor (which turns `None` into a 401)
/// and the WebSocket entry point (which falls back to an anonymous
/// connection).
pub fn decode(secret: &str, token: &str) -> Option<String> {
    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .ok()
        .map(|data| data.claims.sub)
}

/// Decodes and validates the bearer token, yielding the caller's user id.
/// A missing header, a malformed header, or a decode failure all map to
/// §7's `UNAUTHORIZED` — the actix error carries the 401 status directly so
/// handlers never need to special-case it.
pub struct Auth(pub String);

impl Auth {
    pub fn user_id(&self) -> &str {
        &self.0
    }
}

impl FromRequest for Auth {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let secret = req.app_data::<web::Data<String>>().cloned();
        let header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .map(str::to_owned);
        Box::pin(async move {
            let header = header.ok_or_else(|| actix_web::error::ErrorUnauthorized("missing authorization header"))?;
            let token = header
                .strip_prefix("Bearer ")
                .ok_or_else(|| actix_web::error::ErrorUnauthorized("invalid authorization format"))?;
            let secret = secret.ok_or_else(|| actix_web::error::ErrorInternalServerError("jwt secret not configured"))?;
            let user_id = decode(&secret, token).ok_or_else(|| actix_web::error::ErrorUnauthorized("invalid or expired token"))?;
            Ok(Auth(user_id))
        })
    }
}
