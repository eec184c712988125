//! The free-form email template: elements on a fixed-size canvas.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::placeholder;
use crate::{CanvasError, CanvasResult, Element, ElementId, ElementKind, ElementPatch};

/// Default canvas width in pixels.
pub const DEFAULT_CANVAS_WIDTH: u32 = 600;

/// Default canvas height in pixels.
pub const DEFAULT_CANVAS_HEIGHT: u32 = 800;

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CanvasSize {
    /// Create a canvas size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

/// A template: an unordered collection of elements plus the canvas size.
///
/// Collection order carries no meaning; paint order is derived from `z_index`
/// (see [`Template::paint_order`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// All elements.
    pub elements: Vec<Element>,
    /// Canvas dimensions.
    #[serde(default)]
    pub canvas_size: CanvasSize,
}

impl Template {
    /// Create an empty template with the given canvas size.
    #[must_use]
    pub fn new(canvas_size: CanvasSize) -> Self {
        Self {
            elements: Vec::new(),
            canvas_size,
        }
    }

    /// Create a template from existing elements.
    #[must_use]
    pub fn with_elements(canvas_size: CanvasSize, elements: Vec<Element>) -> Self {
        Self {
            elements,
            canvas_size,
        }
    }

    /// Append an element.
    pub fn add_element(&mut self, element: Element) -> ElementId {
        let id = element.id.clone();
        self.elements.push(element);
        id
    }

    /// Remove an element by ID.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
    pub fn remove_element(&mut self, id: &ElementId) -> CanvasResult<Element> {
        let index = self.index_of(id)?;
        Ok(self.elements.remove(index))
    }

    /// Apply a partial update to an element.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
    pub fn update_element(&mut self, id: &ElementId, patch: &ElementPatch) -> CanvasResult<()> {
        let element = self
            .get_element_mut(id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))?;
        element.apply(patch);
        Ok(())
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get_element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Get a mutable reference to an element by ID.
    pub fn get_element_mut(&mut self, id: &ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| &e.id == id)
    }

    fn index_of(&self, id: &ElementId) -> CanvasResult<usize> {
        self.elements
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))
    }

    /// Elements sorted by ascending z-index (painter's order).
    ///
    /// The sort is stable, so ties keep collection order.
    #[must_use]
    pub fn paint_order(&self) -> Vec<&Element> {
        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        ordered.sort_by_key(|e| e.z_index);
        ordered
    }

    /// Highest z-index in the template, if any.
    #[must_use]
    pub fn max_z_index(&self) -> Option<i32> {
        self.elements.iter().map(|e| e.z_index).max()
    }

    /// Find the topmost element at the given canvas coordinates.
    #[must_use]
    pub fn element_at(&self, x: i32, y: i32) -> Option<&Element> {
        self.paint_order()
            .into_iter()
            .rev()
            .find(|e| e.contains_point(x, y))
    }

    /// Every distinct `{{placeholder}}` name used by text and button content, in first-use order.
    #[must_use]
    pub fn placeholders(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for element in self.paint_order() {
            let sources: Vec<&str> = match &element.kind {
                ElementKind::Text { content, .. } => vec![content.as_str()],
                ElementKind::Button { text, href, .. } => vec![text.as_str(), href.as_str()],
                ElementKind::Image { src, alt, .. } => vec![src.as_str(), alt.as_str()],
                ElementKind::Shape { .. } => Vec::new(),
            };
            for name in sources.into_iter().flat_map(placeholder::names) {
                if seen.insert(name.clone()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Get the number of elements in the template.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Check if the template is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Remove all elements.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Serialize the template to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        serde_json::to_string(self).map_err(CanvasError::Serialization)
    }

    /// Deserialize a template from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        serde_json::from_str(json).map_err(CanvasError::Serialization)
    }
}
