//! # CPACS Parser
//!
//! Minimal XML reader/writer used as the document backend for CPACS files.
//! Elements, attributes and character data are kept; the declaration,
//! comments and doctype are dropped.

pub mod ast;
pub mod document;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use ast::{Attribute, Element, Node};
pub use document::XmlDocument;
pub use error::{format_error, ParseError, ParseResult};
pub use parser::{parse, Parser};
pub use serializer::{serialize, Serializer};
pub use tokenizer::{tokenize, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_basic() {
        let source = "<cpacs/>";
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_format_error_mentions_message() {
        let source = "<a><b></a>";
        let err = parse(source).unwrap_err();
        let rendered = format_error(source, "broken.xml", &err);
        assert!(rendered.contains("Mismatched closing tag"));
    }
}
