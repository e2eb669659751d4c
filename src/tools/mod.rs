//! Tools the ReAct agent can call:
//! - `get_word_length`: character count of a word
//! - `multiply`: integer product
//! - `python_repl`: run Python in a child interpreter

pub mod math;
pub mod python;
pub mod text;

pub use math::MultiplyTool;
pub use python::{PythonReplConfig, PythonReplTool};
pub use text::WordLengthTool;

use crate::tool::ToolRegistry;

/// The toolset used by the ReAct demo.
pub fn react_toolkit(python: PythonReplConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(WordLengthTool);
    registry.register(MultiplyTool);
    registry.register(PythonReplTool::new(python));
    registry
}
