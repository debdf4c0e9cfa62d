use crate::ast::*;
use crate::document::XmlDocument;
use std::fmt::Write;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serializer converts a document back to XML text
///
/// Output is deterministic: elements holding only text are written inline,
/// elements with child elements put every child on its own indented line.
/// Parsing the output and serializing again reproduces it byte for byte,
/// which whole-document snapshots rely on.
pub struct Serializer {
    indent_level: usize,
    indent_string: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_string: "  ".to_string(), // 2 spaces
        }
    }

    pub fn with_indent(indent: &str) -> Self {
        Self {
            indent_level: 0,
            indent_string: indent.to_string(),
        }
    }

    /// Serialize a document including the XML declaration
    pub fn serialize(&mut self, doc: &XmlDocument) -> String {
        let mut output = String::new();
        output.push_str(XML_DECLARATION);
        output.push('\n');
        self.serialize_element(doc.root(), &mut output);
        output
    }

    fn serialize_element(&mut self, element: &Element, output: &mut String) {
        self.write_indent(output);
        output.push('<');
        output.push_str(&element.name);
        for attr in &element.attributes {
            let _ = write!(output, " {}=\"{}\"", attr.name, escape_attribute(&attr.value));
        }

        if element.children.is_empty() {
            output.push_str("/>\n");
            return;
        }

        let has_elements = element.children.iter().any(|c| matches!(c, Node::Element(_)));
        if !has_elements {
            output.push('>');
            output.push_str(&escape_text(element.text().trim()));
            let _ = writeln!(output, "</{}>", element.name);
            return;
        }

        output.push_str(">\n");
        self.indent_level += 1;
        for child in &element.children {
            match child {
                Node::Element(e) => self.serialize_element(e, output),
                Node::Text(t) => {
                    let trimmed = t.trim();
                    if !trimmed.is_empty() {
                        self.write_indent(output);
                        output.push_str(&escape_text(trimmed));
                        output.push('\n');
                    }
                }
            }
        }
        self.indent_level -= 1;
        self.write_indent(output);
        let _ = writeln!(output, "</{}>", element.name);
    }

    fn write_indent(&self, output: &mut String) {
        for _ in 0..self.indent_level {
            output.push_str(&self.indent_string);
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a document with default formatting
pub fn serialize(doc: &XmlDocument) -> String {
    Serializer::new().serialize(doc)
}

fn escape_text(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_serialize_layout() {
        let doc = XmlDocument::new(
            Element::new("cpacs").with_child(
                Element::new("wing")
                    .with_attribute("uID", "W1")
                    .with_child(Element::new("name").with_text("Main & Wing"))
                    .with_child(Element::new("sections")),
            ),
        );

        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<cpacs>\n",
            "  <wing uID=\"W1\">\n",
            "    <name>Main &amp; Wing</name>\n",
            "    <sections/>\n",
            "  </wing>\n",
            "</cpacs>\n",
        );
        assert_eq!(serialize(&doc), expected);
    }

    #[test]
    fn test_serialize_is_stable_across_reparse() {
        let source = r#"<?xml version="1.0"?>
            <cpacs><header><name>x &lt; y</name></header>
            <vehicles>mixed <a q="&quot;1&quot;"/> content</vehicles></cpacs>"#;
        let first = serialize(&parse(source).unwrap());
        let second = serialize(&parse(&first).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_indent() {
        let doc = XmlDocument::new(Element::new("a").with_child(Element::new("b")));
        let out = Serializer::with_indent("\t").serialize(&doc);
        assert!(out.contains("\n\t<b/>\n"));
    }
}
