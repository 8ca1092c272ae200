pub mod config;
pub mod connector;
pub mod logging;
pub mod retry;
