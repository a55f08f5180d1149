pub mod cmdline;
pub mod core;
pub mod environment;
pub mod evaluator;
pub mod interpreter;
pub mod printer;
pub mod reader;
pub mod special_forms;
pub mod stream;
pub mod symbols;
pub mod types;

#[macro_use]
extern crate lazy_static;

mod strings;
mod tokens;

pub use environment::Context;
pub use types::LispObject;
