//! # Mail Canvas Core
//!
//! Model and algorithms for a visual email-template designer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               mailcanvas-core               │
//! ├─────────────────────────────────────────────┤
//! │  Model           │  Editing                 │
//! │  - Elements      │  - Selection / editing   │
//! │  - Templates     │  - Z-order               │
//! │  - Structured    │  - Template store        │
//! ├─────────────────────────────────────────────┤
//! │  HTML out        │  HTML / JSON in          │
//! │  - Absolute mode │  - Importer              │
//! │  - Table mode    │  - AI response recovery  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! A [`Template`] is a flat list of absolutely positioned [`Element`]s on a
//! fixed-size canvas. [`generate`] turns it into an email document and
//! [`parser::parse`] turns arbitrary HTML back into elements.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ai;
pub mod css;
pub mod editor;
pub mod element;
pub mod error;
pub mod export;
pub mod generator;
pub mod normalize;
pub mod parser;
pub mod placeholder;
pub mod store;
pub mod structured;
pub mod template;
pub mod zorder;

pub use ai::{parse_design_response, system_prompt, DesignRequest, DesignResponse, DeviceClass};
pub use editor::{Editor, Selection};
pub use element::{
    ButtonStyle, Element, ElementId, ElementKind, ElementPatch, ElementType, ImageStyle,
    ObjectFit, Position, ShapeStyle, ShapeType, Size, TextAlign, TextStyle,
};
pub use error::{CanvasError, CanvasResult};
pub use export::{export, export_file_name, ExportedFile};
pub use generator::{generate, LayoutMode};
pub use normalize::{normalize_element, normalize_elements};
pub use parser::import;
pub use store::{StoreError, TemplateBody, TemplateDraft, TemplateRecord, TemplateStore};
pub use structured::{generate_structured, MoveDirection, StructuredTemplate};
pub use template::{CanvasSize, Template};

/// Mail Canvas core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
