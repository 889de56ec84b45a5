pub mod coverage;
pub mod error;
pub mod filter;
pub mod mutants;
pub mod operators;
pub mod output;
pub mod parser;
pub mod registry;
pub mod runner;
pub mod state;
pub mod syntax;

pub use error::{Error, Result};

pub fn is_python_source(path: &std::path::Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("py")
}
