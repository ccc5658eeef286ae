pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod interactive;
pub mod session;
pub mod storage;
pub mod terminal;
