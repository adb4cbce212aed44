//! Admin key middleware for the booking server.
//! This middleware can be placed on any route or service, and is normally wrapped around the `/admin` scope.
//!
//! It checks the incoming request for an `X-Admin-Key` header matching the configured admin API key. If the key
//! matches, the request continues. Otherwise, a 401 Unauthorized response is returned. When no key has been configured
//! every request is refused. Full user authentication is handled in front of this server.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use booking_common::Secret;
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::errors::ServerError;

pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

pub struct AdminKeyMiddlewareFactory {
    admin_key: Secret<String>,
}

impl AdminKeyMiddlewareFactory {
    pub fn new(admin_key: Secret<String>) -> Self {
        AdminKeyMiddlewareFactory { admin_key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AdminKeyMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminKeyMiddlewareService { admin_key: self.admin_key.clone(), service: Rc::new(service) })
    }
}

pub struct AdminKeyMiddlewareService<S> {
    admin_key: Secret<String>,
    service: Rc<S>,
}

impl<S> AdminKeyMiddlewareService<S> {
    fn is_authorised(&self, req: &ServiceRequest) -> bool {
        if self.admin_key.is_empty() {
            return false;
        }
        req.headers()
            .get(ADMIN_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|key| self.admin_key.matches(key))
            .unwrap_or(false)
    }
}

impl<S, B> Service<ServiceRequest> for AdminKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !self.is_authorised(&req) {
            warn!("💻️ Admin request to {} without a valid {ADMIN_KEY_HEADER} header was refused", req.path());
            return Box::pin(async { Err(ServerError::AdminKeyRequired.into()) });
        }
        let service = Rc::clone(&self.service);
        Box::pin(async move { service.call(req).await })
    }
}
