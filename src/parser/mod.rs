// Selection pipeline parser

pub mod ast;
pub mod command;
pub mod lexer;
pub mod pipeline;

pub use ast::{Command, FilterArg, Pipeline};
pub use pipeline::{parse_pipeline, parse_request};
