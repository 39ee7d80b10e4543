//! Template discovery, the template path field and placeholder introspection.
//!
//! - [`lister`]: finds template files on disk
//! - [`field`]: relative/absolute template path choices
//! - [`loader`]: reads template sources
//! - [`placeholders`]: content regions declared by a template
//! - [`lookup`]: layout metadata for the editor and the JSON endpoint

pub mod error;
pub mod field;
pub mod lister;
pub mod loader;
pub mod lookup;
pub mod placeholders;

pub use error::{LookupError, TemplateError};
pub use field::{TemplateChoice, TemplatePathField};
pub use lister::{FsLister, TemplateLister};
pub use loader::{Template, TemplateLoader};
pub use lookup::{describe_layout, placeholder_data_for, LayoutInfo};
pub use placeholders::{PlaceholderData, PlaceholderScanner, Role};

/// Storage values of the current template choices, as accepted by the registry.
pub fn template_values(settings: &fluentpages_core::Settings) -> Result<Vec<String>, TemplateError> {
    TemplatePathField::from_settings(settings)?.values(&FsLister)
}
