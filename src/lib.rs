pub mod config;
pub mod contexts;
pub mod data;
pub mod registries;
pub mod session_store;
