//! # XML Document
//!
//! Owned element tree with path-based access. Implements
//! [`DocumentBackend`] so a mirror tree can be built from it.

use crate::ast::Element;
use cpacs_common::path::Path;
use cpacs_common::{CommonError, CommonResult, DocumentBackend};

/// Parsed XML document with exactly one root element
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: Element,
}

impl XmlDocument {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Resolve a path to an element
    ///
    /// Malformed paths are errors; well-formed paths that do not resolve
    /// give `Ok(None)`.
    pub fn element_at(&self, path: &str) -> CommonResult<Option<&Element>> {
        let parsed = Path::parse(path)?;
        let mut segments = parsed.segments().iter();

        let Some(first) = segments.next() else {
            return Ok(None);
        };
        if first.element_type != self.root.name || first.ordinal() != 1 {
            return Ok(None);
        }

        let mut current = &self.root;
        for segment in segments {
            match current.nth_child_named(&segment.element_type, segment.ordinal()) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    pub fn element_at_mut(&mut self, path: &str) -> CommonResult<Option<&mut Element>> {
        let parsed = Path::parse(path)?;
        let mut segments = parsed.segments().iter();

        let Some(first) = segments.next() else {
            return Ok(None);
        };
        if first.element_type != self.root.name || first.ordinal() != 1 {
            return Ok(None);
        }

        let mut current = &mut self.root;
        for segment in segments {
            match current.nth_child_named_mut(&segment.element_type, segment.ordinal()) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    fn require(&self, path: &str) -> CommonResult<&Element> {
        self.element_at(path)?
            .ok_or_else(|| CommonError::not_found(path))
    }

    /// Path of the first element (document order) whose `uID` equals `uid`
    pub fn path_of_uid(&self, uid: &str) -> Option<String> {
        self.path_where(&|e| e.attribute("uID") == Some(uid))
    }

    /// Fully indexed path of the first element (document order) matching `predicate`
    pub fn path_where(&self, predicate: &dyn Fn(&Element) -> bool) -> Option<String> {
        fn search(element: &Element, path: &str, predicate: &dyn Fn(&Element) -> bool) -> Option<String> {
            if predicate(element) {
                return Some(path.to_string());
            }
            let mut seen: Vec<(&str, usize)> = Vec::new();
            for child in element.child_elements() {
                let ordinal = match seen.iter_mut().find(|(n, _)| *n == child.name) {
                    Some(entry) => {
                        entry.1 += 1;
                        entry.1
                    }
                    None => {
                        seen.push((child.name.as_str(), 1));
                        1
                    }
                };
                let child_path = format!("{}/{}[{}]", path, child.name, ordinal);
                if let Some(found) = search(child, &child_path, predicate) {
                    return Some(found);
                }
            }
            None
        }
        search(&self.root, &format!("/{}", self.root.name), predicate)
    }
}

impl DocumentBackend for XmlDocument {
    fn resolve_path(&self, path: &str) -> bool {
        matches!(self.element_at(path), Ok(Some(_)))
    }

    fn child_count(&self, path: &str) -> CommonResult<usize> {
        Ok(self.require(path)?.child_elements().count())
    }

    fn child_types_and_counts(&self, path: &str) -> CommonResult<Vec<(String, usize)>> {
        let element = self.require(path)?;
        let mut counts: Vec<(String, usize)> = Vec::new();
        for child in element.child_elements() {
            match counts.iter_mut().find(|(name, _)| *name == child.name) {
                Some(entry) => entry.1 += 1,
                None => counts.push((child.name.clone(), 1)),
            }
        }
        Ok(counts)
    }

    fn get_attribute(&self, path: &str, name: &str) -> CommonResult<Option<String>> {
        Ok(self.require(path)?.attribute(name).map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    const SOURCE: &str = r#"
        <cpacs>
            <wings>
                <wing uID="W1"/>
                <name>wings</name>
                <wing uID="W2"><sections/></wing>
            </wings>
        </cpacs>
    "#;

    #[test]
    fn test_resolve_with_and_without_ordinals() {
        let doc = parse(SOURCE).unwrap();
        assert!(doc.resolve_path("/cpacs/wings"));
        assert!(doc.resolve_path("/cpacs/wings[1]/wing"));
        assert!(doc.resolve_path("/cpacs/wings/wing[2]/sections"));
        assert!(!doc.resolve_path("/cpacs/wings/wing[3]"));
        assert!(!doc.resolve_path("/other"));
        assert!(!doc.resolve_path("/cpacs/wing[2"));
    }

    #[test]
    fn test_child_types_in_first_appearance_order() {
        let doc = parse(SOURCE).unwrap();
        let types = doc.child_types_and_counts("/cpacs/wings").unwrap();
        assert_eq!(types, vec![("wing".to_string(), 2), ("name".to_string(), 1)]);
        assert_eq!(doc.child_count("/cpacs/wings").unwrap(), 3);
    }

    #[test]
    fn test_missing_attribute_is_none() {
        let doc = parse(SOURCE).unwrap();
        assert_eq!(
            doc.get_attribute("/cpacs/wings/wing[2]", "uID").unwrap().as_deref(),
            Some("W2")
        );
        assert_eq!(doc.get_attribute("/cpacs/wings", "uID").unwrap(), None);
        assert!(matches!(
            doc.get_attribute("/cpacs/nothing", "uID"),
            Err(CommonError::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_path_is_reported() {
        let doc = parse(SOURCE).unwrap();
        assert!(matches!(
            doc.child_count("/cpacs/wings[x]"),
            Err(CommonError::MalformedPath(_))
        ));
    }

    #[test]
    fn test_path_of_uid() {
        let doc = parse(SOURCE).unwrap();
        assert_eq!(doc.path_of_uid("W2").as_deref(), Some("/cpacs/wings[1]/wing[2]"));
        assert!(doc.path_of_uid("missing").is_none());
        assert_eq!(
            doc.path_where(&|e| e.name == "sections").as_deref(),
            Some("/cpacs/wings[1]/wing[2]/sections[1]")
        );
    }
}
