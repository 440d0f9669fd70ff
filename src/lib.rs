pub mod admin;
pub mod auth;
pub mod client;
pub mod db;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod notification;
pub mod routes;
pub mod sanitize;
pub mod state;
pub mod stats;
pub mod upload;
pub mod user;
pub mod visit;
