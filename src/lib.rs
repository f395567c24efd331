pub mod common;
pub mod config;
pub mod network;
pub mod store;
pub mod sync;
pub mod ui;
