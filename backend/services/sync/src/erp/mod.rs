pub mod classify;
pub mod client;
pub mod models;
pub mod relay;
