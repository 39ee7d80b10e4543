//! fluentpages core library: domain types, settings, registry persistence,
//! permission gate, errors.
//!
//! - [`types`]: newtypes, layouts and pages
//! - [`settings`]: validated process configuration
//! - [`registry`]: layout/page storage
//! - [`permissions`]: layout-change policy and editable fields
//! - [`form`]: page editor state
//! - [`error`]: [`RegistryError`], [`ConfigError`]

pub mod error;
pub mod form;
pub mod permissions;
pub mod registry;
pub mod settings;
pub mod types;

pub use error::{ConfigError, RegistryError};
pub use form::{LayoutOption, PageForm};
pub use permissions::{CapabilityPolicy, LayoutChangePolicy, Principal};
pub use settings::{Settings, TemplateRoot};
pub use types::{Layout, LayoutId, LayoutKey, Page, PageId, PageKind};
