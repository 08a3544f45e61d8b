pub mod config;
pub mod handlers;
pub mod inference;
pub mod repository;
pub mod secrets;
pub mod shared;
pub mod terraform;
