pub mod application;
pub mod config;
pub mod domain;
pub mod interfaces;
pub mod infrastructure;
