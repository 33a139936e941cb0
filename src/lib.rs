pub mod battery;
pub mod config;
pub mod cycler;
pub mod error;
pub mod export;
pub mod init_config;
pub mod simulation;
pub mod solver;

pub mod app;
