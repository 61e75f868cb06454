// Forkful recipe-discovery backend library

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod quota;
pub mod recipes;
pub mod server;
pub mod service;
pub mod upstream;
pub mod videos;
