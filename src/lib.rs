pub mod client;
pub mod config;
pub mod handler;
pub mod http_server;
pub mod service;
pub mod telemetry;
