pub mod app;
pub mod config;
pub mod domain;
pub mod events;
pub mod filter;
pub mod infrastructure;
pub mod page;
pub mod settings;
pub mod storage;
pub mod tasks;
