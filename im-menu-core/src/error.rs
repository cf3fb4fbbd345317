//! Error types for menu editing and document handling

use thiserror::Error;

use crate::models::ItemType;

/// Validation rejections raised by menu tree mutations.
///
/// A mutation that returns one of these has not changed the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MenuError {
    #[error("Menu name must not be empty")]
    EmptyName,

    #[error("Menu item label must not be empty")]
    EmptyLabel,

    #[error("Menu not found: {0}")]
    UnknownMenu(String),

    #[error("Unknown sub-menu selected: {0}")]
    UnknownTarget(String),

    #[error("The Home menu cannot be nested inside another menu")]
    RootCannotBeNested,

    #[error("A menu cannot target itself")]
    SelfLink,

    #[error("Linking '{0}' would create a circular menu hierarchy")]
    CyclicLink(String),

    #[error("'{0}' already belongs to another menu")]
    AlreadyClaimed(String),

    #[error("Create a sub-menu before linking it")]
    NoSubmenuAvailable,

    #[error("Menu '{menu_id}' has no item at position {index}")]
    UnknownItem { menu_id: String, index: usize },

    #[error("Menu item '{item_id}' is a {actual} item")]
    ItemTypeMismatch { item_id: String, actual: ItemType },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Unknown web link: {0}")]
    UnknownWeblink(String),

    #[error("Configure at least one menu item on the Home menu before exporting")]
    EmptyRootMenu,
}

/// Failures reading or writing a whole configuration document
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Unable to parse configuration: {0}")]
    Parse(String),

    #[error("Unable to serialize configuration: {0}")]
    Serialize(String),
}
