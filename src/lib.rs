pub mod appointments;
pub mod clients;
pub mod config;
pub mod error;
pub mod gateway;
pub mod inquiries;
pub mod models;
pub mod notify;
pub mod reference;
pub mod routes;
pub mod store;
