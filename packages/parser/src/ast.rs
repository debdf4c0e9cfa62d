use serde::{Deserialize, Serialize};

/// Attribute of an element, value stored decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Child of an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Element(Element),
    /// Character data, trimmed and decoded
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }
}

/// XML element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// Concatenated character data of the direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.child_elements().filter(move |e| e.name == name)
    }

    /// The `ordinal`-th (1-based) child element named `name`
    pub fn nth_child_named(&self, name: &str, ordinal: usize) -> Option<&Element> {
        if ordinal == 0 {
            return None;
        }
        self.child_elements().filter(|e| e.name == name).nth(ordinal - 1)
    }

    pub fn nth_child_named_mut(&mut self, name: &str, ordinal: usize) -> Option<&mut Element> {
        if ordinal == 0 {
            return None;
        }
        self.child_elements_mut()
            .filter(|e| e.name == name)
            .nth(ordinal - 1)
    }

    pub fn first_child_named(&self, name: &str) -> Option<&Element> {
        self.nth_child_named(name, 1)
    }

    pub fn first_child_named_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.nth_child_named_mut(name, 1)
    }

    /// Index into `children` of the `ordinal`-th child element named `name`
    pub fn position_of(&self, name: &str, ordinal: usize) -> Option<usize> {
        if ordinal == 0 {
            return None;
        }
        self.children
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Node::Element(e) if e.name == name))
            .nth(ordinal - 1)
            .map(|(i, _)| i)
    }

    /// Index into `children` of the first child element carrying `uID == uid`
    pub fn position_of_uid(&self, uid: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|c| matches!(c, Node::Element(e) if e.attribute("uID") == Some(uid)))
    }

    /// Text of the first child element named `name`
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.first_child_named(name).map(Element::text)
    }

    /// Depth-first search including `self`
    pub fn find(&self, predicate: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if predicate(self) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find(predicate))
    }

    /// Depth-first visit including `self`
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Element)) {
        visit(self);
        for child in self.child_elements() {
            child.walk(visit);
        }
    }
}
