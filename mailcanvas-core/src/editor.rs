//! Canvas editor: selection, text-editing mode and structural mutations.
//!
//! The editor owns one [`Template`]. Every structural mutation bumps a
//! revision counter; the rendered preview is recomputed lazily the next time
//! it is asked for after the revision (or layout mode) changed.

use serde::{Deserialize, Serialize};

use crate::ai::parse_design_response;
use crate::export::{export, ExportedFile};
use crate::generator::{generate, LayoutMode};
use crate::parser;
use crate::{
    zorder, CanvasError, CanvasResult, CanvasSize, Element, ElementId, ElementPatch, ElementType,
    Position, Size, Template,
};

/// Offset applied to duplicated elements.
pub const DUPLICATE_OFFSET: (i32, i32) = (20, 20);

/// Selection state of the canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "lowercase")]
pub enum Selection {
    /// Nothing selected.
    #[default]
    Idle,
    /// One element selected for direct manipulation.
    Selected(ElementId),
    /// A text element is being edited in place; drag and resize are disabled.
    Editing(ElementId),
}

impl Selection {
    /// The selected (or edited) element.
    #[must_use]
    pub fn id(&self) -> Option<&ElementId> {
        match self {
            Self::Idle => None,
            Self::Selected(id) | Self::Editing(id) => Some(id),
        }
    }

    /// True when `id` is being edited in place.
    #[must_use]
    pub fn is_editing(&self, id: &ElementId) -> bool {
        matches!(self, Self::Editing(editing) if editing == id)
    }
}

#[derive(Debug, Clone)]
struct Preview {
    revision: u64,
    mode: LayoutMode,
    html: String,
}

/// An editing session over one template.
#[derive(Debug, Clone)]
pub struct Editor {
    template: Template,
    selection: Selection,
    layout_mode: LayoutMode,
    revision: u64,
    preview: Option<Preview>,
}

impl Editor {
    /// Start with an empty canvas.
    #[must_use]
    pub fn new(canvas_size: CanvasSize) -> Self {
        Self::from_template(Template::new(canvas_size))
    }

    /// Start from an existing template. Shared z-indices are renumbered.
    #[must_use]
    pub fn from_template(mut template: Template) -> Self {
        zorder::make_unique(&mut template.elements);
        Self {
            template,
            selection: Selection::Idle,
            layout_mode: LayoutMode::default(),
            revision: 0,
            preview: None,
        }
    }

    /// The current template.
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Consume the editor, returning the template.
    #[must_use]
    pub fn into_template(self) -> Template {
        self.template
    }

    /// Current selection state.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selected element, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&Element> {
        self.selection
            .id()
            .and_then(|id| self.template.get_element(id))
    }

    /// Mutation counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Layout mode used for preview and export.
    #[must_use]
    pub fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    /// Switch the layout mode used for preview and export.
    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        self.layout_mode = mode;
    }

    /// Resize the canvas.
    pub fn set_canvas_size(&mut self, canvas_size: CanvasSize) {
        if self.template.canvas_size != canvas_size {
            self.template.canvas_size = canvas_size;
            self.touch();
        }
    }

    // ---------------------------------------------------------------------
    // Selection state machine
    // ---------------------------------------------------------------------

    /// Click on an element: select it. Clicking the element being edited keeps editing.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
    pub fn click_element(&mut self, id: &ElementId) -> CanvasResult<()> {
        self.require(id)?;
        if !self.selection.is_editing(id) {
            self.selection = Selection::Selected(id.clone());
        }
        Ok(())
    }

    /// Click at canvas coordinates: selects the topmost element there, or clears the selection.
    pub fn click_at(&mut self, x: i32, y: i32) -> Option<ElementId> {
        let hit = self.template.element_at(x, y).map(|e| e.id.clone());
        match &hit {
            Some(id) if !self.selection.is_editing(id) => {
                self.selection = Selection::Selected(id.clone());
            }
            Some(_) => {}
            None => self.click_empty(),
        }
        hit
    }

    /// Click on empty canvas.
    pub fn click_empty(&mut self) {
        self.selection = Selection::Idle;
    }

    /// Double-click: a selected text element enters in-place editing.
    ///
    /// Returns `true` when editing started.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
    pub fn double_click(&mut self, id: &ElementId) -> CanvasResult<bool> {
        let is_text = self.require(id)?.element_type() == ElementType::Text;
        match &self.selection {
            Selection::Selected(selected) if selected == id && is_text => {
                tracing::debug!(element = %id, "Editing text in place");
                self.selection = Selection::Editing(id.clone());
                Ok(true)
            }
            Selection::Editing(editing) if editing == id => Ok(true),
            _ => Ok(false),
        }
    }

    /// Blur or Escape: leave in-place editing, keeping the element selected.
    pub fn end_editing(&mut self) {
        if let Selection::Editing(id) = &self.selection {
            self.selection = Selection::Selected(id.clone());
        }
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Add a default element of `element_type` at `(50, 50)` on top of the stack and select it.
    pub fn add_element(&mut self, element_type: ElementType) -> ElementId {
        let z_index = i32::try_from(self.template.element_count()).unwrap_or(i32::MAX);
        let z_index = z_index.max(zorder::next_z(&self.template.elements));
        let id = self
            .template
            .add_element(Element::default_of(element_type, z_index));
        self.selection = Selection::Selected(id.clone());
        self.touch();
        id
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has this ID, or
    /// [`CanvasError::InvalidOperation`] for a move or resize of the element
    /// being edited in place.
    pub fn update_element(&mut self, id: &ElementId, patch: &ElementPatch) -> CanvasResult<()> {
        if patch.touches_geometry() && self.selection.is_editing(id) {
            return Err(CanvasError::InvalidOperation(format!(
                "element {id} is being edited; finish editing before moving or resizing it"
            )));
        }
        self.template.update_element(id, patch)?;
        self.touch();
        Ok(())
    }

    /// Drag an element to a new position.
    ///
    /// # Errors
    ///
    /// See [`Editor::update_element`].
    pub fn move_element(&mut self, id: &ElementId, position: Position) -> CanvasResult<()> {
        self.update_element(id, &ElementPatch::moved_to(position))
    }

    /// Resize an element.
    ///
    /// # Errors
    ///
    /// See [`Editor::update_element`].
    pub fn resize_element(&mut self, id: &ElementId, size: Size) -> CanvasResult<()> {
        self.update_element(id, &ElementPatch::resized_to(size))
    }

    /// Delete an element, clearing the selection if it referenced it.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
    pub fn delete_element(&mut self, id: &ElementId) -> CanvasResult<Element> {
        let removed = self.template.remove_element(id)?;
        if self.selection.id() == Some(id) {
            self.selection = Selection::Idle;
        }
        self.touch();
        Ok(removed)
    }

    /// Clone an element offset by `(+20, +20)` on top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
    pub fn duplicate_element(&mut self, id: &ElementId) -> CanvasResult<ElementId> {
        let z_index = zorder::next_z(&self.template.elements);
        let copy = self
            .require(id)?
            .duplicate(DUPLICATE_OFFSET.0, DUPLICATE_OFFSET.1)
            .with_z_index(z_index);
        let new_id = self.template.add_element(copy);
        self.touch();
        Ok(new_id)
    }

    /// Swap with the next element above.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
    pub fn bring_forward(&mut self, id: &ElementId) -> CanvasResult<bool> {
        let moved = zorder::bring_forward(&mut self.template.elements, id)?;
        Ok(self.touch_if(moved))
    }

    /// Swap with the next element below.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
    pub fn send_backward(&mut self, id: &ElementId) -> CanvasResult<bool> {
        let moved = zorder::send_backward(&mut self.template.elements, id)?;
        Ok(self.touch_if(moved))
    }

    /// Move above every other element.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
    pub fn bring_to_front(&mut self, id: &ElementId) -> CanvasResult<bool> {
        let moved = zorder::bring_to_front(&mut self.template.elements, id)?;
        Ok(self.touch_if(moved))
    }

    /// Move below every other element.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has this ID.
    pub fn send_to_back(&mut self, id: &ElementId) -> CanvasResult<bool> {
        let moved = zorder::send_to_back(&mut self.template.elements, id)?;
        Ok(self.touch_if(moved))
    }

    /// Replace every element (import, raw HTML edit, AI design). Clears the selection.
    pub fn replace_elements(&mut self, mut elements: Vec<Element>) {
        zorder::make_unique(&mut elements);
        self.template.elements = elements;
        self.selection = Selection::Idle;
        self.touch();
    }

    /// Import HTML, replacing the canvas. The canvas is unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] for blank input or
    /// [`CanvasError::NothingFound`] when nothing was recognized.
    pub fn import_html(&mut self, html: &str) -> CanvasResult<usize> {
        let elements = parser::import(html)?;
        let count = elements.len();
        self.replace_elements(elements);
        tracing::info!(count, "Imported elements from HTML");
        Ok(count)
    }

    /// Load raw AI output, replacing the canvas. The canvas is unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDesign`] when the output cannot be
    /// recovered or contains no usable element.
    pub fn apply_design_response(&mut self, content: &str) -> CanvasResult<usize> {
        let elements = parse_design_response(content)?;
        if elements.is_empty() {
            return Err(CanvasError::InvalidDesign(
                "the design contained no usable elements".to_string(),
            ));
        }
        let count = elements.len();
        self.replace_elements(elements);
        Ok(count)
    }

    // ---------------------------------------------------------------------
    // Derived output
    // ---------------------------------------------------------------------

    /// Rendered HTML for the current layout mode, regenerated only when stale.
    pub fn preview(&mut self) -> &str {
        let stale = self
            .preview
            .as_ref()
            .map_or(true, |p| p.revision != self.revision || p.mode != self.layout_mode);
        if stale {
            tracing::trace!(revision = self.revision, mode = %self.layout_mode, "Regenerating preview");
            self.preview = Some(Preview {
                revision: self.revision,
                mode: self.layout_mode,
                html: generate(&self.template, self.layout_mode),
            });
        }
        self.preview.as_ref().map_or("", |p| p.html.as_str())
    }

    /// Render for download in the current layout mode.
    #[must_use]
    pub fn export(&self, name: &str) -> ExportedFile {
        export(name, &self.template, self.layout_mode)
    }

    fn require(&self, id: &ElementId) -> CanvasResult<&Element> {
        self.template
            .get_element(id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn touch_if(&mut self, changed: bool) -> bool {
        if changed {
            self.touch();
        }
        changed
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(CanvasSize::default())
    }
}
