//! HTTP API handlers for mashup-web

pub mod form;
pub mod health;
pub mod page;

pub use form::form_routes;
pub use health::health_routes;
