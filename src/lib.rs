//! Parsing, strengthening and printing of inferred Dhall record types.
//!
//! The input is the type an inference tool derived from sample manifests,
//! such as `{ Deployment : { web : { image : Text } } }`. It is parsed into
//! an [`ast::Type`], rewritten by a [`transform::Pipeline`] and printed back
//! in canonical layout.

/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The printer maps an AST back into type syntax.
pub mod printer;

/// Passes that rewrite an AST into a more precise one.
pub mod transform;

pub mod ast;
pub mod config;
pub mod error;
pub mod samples;
pub mod token;

pub mod util {
    pub mod tree;
    #[cfg(test)]
    pub(crate) mod test_utils;
}

pub use error::{Error, Result};

/// Parses `src`, runs `pipeline` over it and prints the result.
///
/// Nothing is returned unless every stage succeeds.
pub fn strengthen(src: &str, pipeline: &transform::Pipeline) -> Result<String> {
    let ty = parser::parse_in_new(src)?;
    let ty = pipeline.run(ty);
    Ok(printer::print_string(&ty, 0))
}
