pub mod action;
pub mod config;
pub mod error;
pub mod platform;
pub mod queue;
pub mod shutdown;
pub mod workflow;
pub mod workspace;
