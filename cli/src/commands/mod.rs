pub mod checkpoint;
pub mod config;
pub mod health;
pub mod resolve;
