pub mod signal_parser;
pub mod validator;

pub use signal_parser::{looks_like_signal, parse, ParseError};
pub use validator::validate;
