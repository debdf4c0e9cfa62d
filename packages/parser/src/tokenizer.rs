use logos::Logos;
use std::fmt;

/// Token types for XML markup
///
/// Character data between tags is not tokenized: the parser slices it out of
/// the source using the spans of the surrounding markup tokens, so anything
/// the lexer makes of text content is ignored.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
#[logos(skip r"<\?([^?]|\?[^>])*\?>")]
#[logos(skip r"<!--([^-]|-[^-])*-->")]
#[logos(skip r"<!DOCTYPE[^>]*>")]
pub enum Token<'src> {
    #[token("</")]
    CloseTagStart,

    #[token("<")]
    LAngle,

    #[token("/>")]
    SelfClose,

    #[token(">")]
    RAngle,

    #[token("=")]
    Equals,

    // Element and attribute names, including namespace prefixes
    #[regex(r"[A-Za-z_][A-Za-z0-9_.:-]*", |lex| lex.slice())]
    Name(&'src str),

    // Quoted attribute values (quotes stripped, entities still encoded)
    #[regex(r#""[^"<]*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r"'[^'<]*'", |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Quoted(&'src str),
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::CloseTagStart => write!(f, "</"),
            Token::LAngle => write!(f, "<"),
            Token::SelfClose => write!(f, "/>"),
            Token::RAngle => write!(f, ">"),
            Token::Equals => write!(f, "="),
            Token::Name(s) => write!(f, "name '{}'", s),
            Token::Quoted(s) => write!(f, "string \"{}\"", s),
        }
    }
}

/// Tokenize a source string
pub fn tokenize(source: &str) -> Vec<(Token, std::ops::Range<usize>)> {
    let lexer = Token::lexer(source);
    lexer
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, span)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_tokens() {
        let tokens = tokenize(r#"<wing uID="W1"/>"#);
        let kinds: Vec<_> = tokens.into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::LAngle,
                Token::Name("wing"),
                Token::Name("uID"),
                Token::Equals,
                Token::Quoted("W1"),
                Token::SelfClose,
            ]
        );
    }

    #[test]
    fn test_close_tag() {
        let tokens = tokenize("<a></a>");
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[2].0, Token::RAngle);
        assert_eq!(tokens[3].0, Token::CloseTagStart);
        assert_eq!(tokens[4].0, Token::Name("a"));
    }

    #[test]
    fn test_declaration_and_comments_skipped() {
        let source = "<?xml version=\"1.0\"?>\n<!-- header --><cpacs/>";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].0, Token::LAngle);
        assert_eq!(tokens[1].0, Token::Name("cpacs"));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_single_quoted_values() {
        let tokens = tokenize("<a b='x y'/>");
        assert_eq!(tokens[4].0, Token::Quoted("x y"));
    }

    #[test]
    fn test_spans_point_into_source() {
        let source = "<name>0.5</name>";
        let tokens = tokenize(source);
        let (_, gt) = &tokens[2];
        let (_, close) = &tokens[3];
        assert_eq!(&source[gt.end..close.start], "0.5");
    }
}
