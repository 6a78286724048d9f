pub mod artifact;
pub mod cache;
pub mod cli;
pub mod command;
pub mod config;
pub mod detect;
pub mod error;
pub mod initramfs;
pub mod logging;
pub mod mode;
pub mod output;
pub mod root;
pub mod session;
pub mod switch;
