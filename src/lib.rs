#![doc = "The `taskledger` library crate."]
#![doc = ""]
#![doc = "Domain models, persistence, token authentication, role checks and the HTTP routes"]
#![doc = "of the task manager. The binary (`main.rs`) wires them into an `HttpServer`."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;

use actix_cors::Cors;

pub const FRONTEND_ORIGIN: &str = "http://localhost:3000";

/// CORS policy: any origin in debug mode, otherwise only the local frontend.
///
/// Credentials are only allowed with the explicit origin; actix-cors rejects them
/// alongside a wildcard.
pub fn cors(debug: bool) -> Cors {
    let cors = if debug {
        Cors::default().allow_any_origin()
    } else {
        Cors::default()
            .allowed_origin(FRONTEND_ORIGIN)
            .supports_credentials()
    };
    cors.allow_any_method().allow_any_header().max_age(3600)
}
