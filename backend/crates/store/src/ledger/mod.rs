pub mod json_repository;
pub mod repositories;
