pub mod account;
pub mod auth;
pub mod bill;
pub mod config;
pub mod errors;
pub mod friendship;
pub mod guard;
pub mod routes;
pub mod schemas;
pub mod search;
pub mod store;
