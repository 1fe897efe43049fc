pub mod append;
pub mod completions;
pub mod config;
pub mod context;
pub mod edit;
pub mod fixup;
pub mod list;
pub mod log;
pub mod pull;
pub mod push;
pub mod rebase;
pub mod show;
pub mod switch;

pub use context::StackContext;
