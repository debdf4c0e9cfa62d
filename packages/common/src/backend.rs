use crate::result::CommonResult;

/// Path-based read access to a hierarchical document
///
/// Paths use the restricted language of [`crate::path`]. Implementations
/// must treat a segment without ordinal as ordinal 1.
pub trait DocumentBackend {
    /// Check whether an element exists at `path`
    fn resolve_path(&self, path: &str) -> bool;

    /// Number of direct child elements
    fn child_count(&self, path: &str) -> CommonResult<usize>;

    /// Distinct child element types with their counts, in order of first appearance
    fn child_types_and_counts(&self, path: &str) -> CommonResult<Vec<(String, usize)>>;

    /// Read an attribute; `Ok(None)` when the element exists but the attribute does not
    fn get_attribute(&self, path: &str, name: &str) -> CommonResult<Option<String>>;
}
