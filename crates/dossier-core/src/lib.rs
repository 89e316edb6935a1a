pub mod atlas;
pub mod compile;
pub mod config;
pub mod contribution;
pub mod diagram;
pub mod error;
pub mod gate;
pub mod glob;
pub mod io;
pub mod manifest;
pub mod nav;
pub mod page;
pub mod paths;
pub mod project;
pub mod text;
pub mod tool_runner;
pub mod tour;
pub mod types;

pub use error::{Result, SiteError};
