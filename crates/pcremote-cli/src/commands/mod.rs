pub mod agent;
pub mod catalog;
pub mod config;
pub mod decide;
pub mod hook;
pub mod pending;
pub mod send;
pub mod status;
pub mod watch;
