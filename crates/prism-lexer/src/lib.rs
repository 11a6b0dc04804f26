//! Single-pass GLSL scanner and the random-access token stream the parser
//! consumes. Tokens live only for the duration of a parse; the vector they
//! sit in is recycled through `prism-pool`.

mod lexer;
mod stream;
mod token;

pub use lexer::{Lexer, tokenize};
pub use stream::TokenStream;
pub use token::{Directive, Keyword, Op, Token, TokenKind, is_builtin_name};
