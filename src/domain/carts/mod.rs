//! Carts

pub mod models;
