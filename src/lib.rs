pub mod api_doc;
pub mod auth;
pub mod category;
pub mod config;
pub mod db;
pub mod keycloak;
pub mod routes;
pub mod server;
pub mod users;
pub mod validation;
