pub mod bitbucket;
pub mod cli;
pub mod config;
pub mod errors;
pub mod git;
pub mod stack;
pub mod utils;

pub use errors::{Result, StackError};
