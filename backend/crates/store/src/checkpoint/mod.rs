pub mod json_repository;
pub mod models;
pub mod repositories;
