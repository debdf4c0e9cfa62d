use crate::ast::*;
use crate::document::XmlDocument;
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize, Token};

/// Recursive-descent parser for XML documents
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, std::ops::Range<usize>)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            tokens: tokenize(source),
            pos: 0,
        }
    }

    /// Parse a complete document with exactly one root element
    pub fn parse_document(&mut self) -> ParseResult<XmlDocument> {
        let root = self.parse_element()?;

        if let Some((token, span)) = self.peek() {
            return Err(ParseError::unexpected_token(
                span.start,
                "end of document",
                token.to_string(),
            ));
        }

        Ok(XmlDocument::new(root))
    }

    fn parse_element(&mut self) -> ParseResult<Element> {
        self.expect(Token::LAngle, "'<'")?;
        let name = self.expect_name()?;
        let mut element = Element::new(name);

        loop {
            match self.advance() {
                Some((Token::Name(attr), span)) => {
                    let attr_pos = span.start;
                    self.expect(Token::Equals, "'='")?;
                    let raw = self.expect_quoted()?;
                    if element.attribute(attr).is_some() {
                        return Err(ParseError::invalid_syntax(
                            attr_pos,
                            format!("duplicate attribute '{}'", attr),
                        ));
                    }
                    element.set_attribute(attr, decode_entities(raw, attr_pos)?);
                }
                Some((Token::SelfClose, _)) => return Ok(element),
                Some((Token::RAngle, span)) => {
                    let content_start = span.end;
                    self.parse_content(&mut element, content_start)?;
                    return Ok(element);
                }
                Some((token, span)) => {
                    return Err(ParseError::unexpected_token(
                        span.start,
                        "attribute, '>' or '/>'",
                        token.to_string(),
                    ));
                }
                None => return Err(ParseError::unexpected_eof(self.source.len())),
            }
        }
    }

    /// Parse children and character data up to and including the closing tag
    fn parse_content(&mut self, element: &mut Element, mut text_start: usize) -> ParseResult<()> {
        loop {
            let Some((token, span)) = self.peek() else {
                return Err(ParseError::unexpected_eof(self.source.len()));
            };
            let tag_start = span.start;

            match token {
                Token::LAngle => {
                    self.push_text(element, text_start, tag_start)?;
                    let child = self.parse_element()?;
                    element.children.push(Node::Element(child));
                    text_start = self.previous_end();
                }
                Token::CloseTagStart => {
                    self.push_text(element, text_start, tag_start)?;
                    self.advance();
                    let (closing, pos) = self.expect_name_at()?;
                    if closing != element.name {
                        return Err(ParseError::mismatched_tag(pos, element.name.clone(), closing));
                    }
                    self.expect(Token::RAngle, "'>'")?;
                    return Ok(());
                }
                // anything else is character data, recovered from the source below
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn push_text(&self, element: &mut Element, start: usize, end: usize) -> ParseResult<()> {
        if start >= end {
            return Ok(());
        }
        let raw = strip_comments(&self.source[start..end]);
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            element
                .children
                .push(Node::Text(decode_entities(trimmed, start)?));
        }
        Ok(())
    }

    // Helper methods

    fn peek(&self) -> Option<(Token<'src>, std::ops::Range<usize>)> {
        self.tokens.get(self.pos).cloned()
    }

    fn advance(&mut self) -> Option<(Token<'src>, std::ops::Range<usize>)> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, span)| span.end)
            .unwrap_or(0)
    }

    fn expect(&mut self, expected: Token<'src>, description: &str) -> ParseResult<()> {
        match self.advance() {
            Some((token, _)) if token == expected => Ok(()),
            Some((token, span)) => Err(ParseError::unexpected_token(
                span.start,
                description,
                token.to_string(),
            )),
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }

    fn expect_name(&mut self) -> ParseResult<String> {
        Ok(self.expect_name_at()?.0)
    }

    fn expect_name_at(&mut self) -> ParseResult<(String, usize)> {
        match self.advance() {
            Some((Token::Name(name), span)) => Ok((name.to_string(), span.start)),
            Some((token, span)) => Err(ParseError::unexpected_token(
                span.start,
                "name",
                token.to_string(),
            )),
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }

    fn expect_quoted(&mut self) -> ParseResult<&'src str> {
        match self.advance() {
            Some((Token::Quoted(value), _)) => Ok(value),
            Some((token, span)) => Err(ParseError::unexpected_token(
                span.start,
                "quoted value",
                token.to_string(),
            )),
            None => Err(ParseError::unexpected_eof(self.source.len())),
        }
    }
}

/// Parse an XML document
pub fn parse(source: &str) -> ParseResult<XmlDocument> {
    let doc = Parser::new(source).parse_document()?;
    if tracing::enabled!(tracing::Level::DEBUG) {
        let mut elements = 0usize;
        doc.root().walk(&mut |_| elements += 1);
        tracing::debug!(bytes = source.len(), elements, "parsed document");
    }
    Ok(doc)
}

fn strip_comments(raw: &str) -> std::borrow::Cow<'_, str> {
    if !raw.contains("<!--") {
        return std::borrow::Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find("<!--") {
        out.push_str(&rest[..open]);
        match rest[open..].find("-->") {
            Some(close) => rest = &rest[open + close + 3..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    std::borrow::Cow::Owned(out)
}

/// Decode the predefined entities and numeric character references
pub fn decode_entities(raw: &str, pos: usize) -> ParseResult<String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let semi = tail
            .find(';')
            .ok_or_else(|| ParseError::invalid_syntax(pos, "unterminated entity reference"))?;
        let entity = &tail[1..semi];
        let decoded = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32).ok_or_else(|| {
                    ParseError::invalid_syntax(pos, format!("unknown entity '&{};'", entity))
                })?
            }
        };
        out.push(decoded);
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
