pub mod db;
pub mod project;
pub mod project_services;
