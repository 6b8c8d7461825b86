//! Entities for the business site: users, catalog services and contact messages.

pub mod errors;
pub mod db;
pub mod enums;
pub mod user;
pub mod service;
pub mod contact;

pub use enums::{Category, ContactStatus, Currency, Priority, Role};
