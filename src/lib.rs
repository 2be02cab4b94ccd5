#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod notify;
pub mod panel;
pub mod remote;
pub mod settings;
