pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod schema;
pub mod service;

pub use ast::{Node, Spanned, Token};
pub use compiler::{SqlParam, SqlQuery, compile};
pub use error::{SearchSyntaxError, SyntaxErrorCause};
pub use lexer::{Lexer, insert_implicit_and, tokenize};
pub use parser::{Parser, parse_query};
pub use schema::Join;
pub use service::{SearchError, SearchOptions, SearchService};
