pub mod cli;
pub mod config;
pub mod email_sender;
pub mod github;
pub mod goals;
pub mod models;
pub mod report;
pub mod wait;

pub use models::Result;
