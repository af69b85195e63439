pub mod config;
pub mod fetch;
pub mod health;
pub mod stat;
pub mod upload;


pub use config::config_handler;
pub use fetch::{fetch_handler, fetch_in_container_handler};
pub use health::{health_handler, readiness_handler};
pub use stat::stat_handler;
pub use upload::upload_handler;
