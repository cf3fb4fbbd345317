pub mod config;
pub mod document;
pub mod error;
pub mod models;
pub mod registry;
pub mod session;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use config::{get_settings_path, Settings};
pub use document::{
    default_structure, legacy_login_sections, IncomingDocument, LegacyItem, MenuDocument,
    DOCUMENT_VERSION,
};
pub use error::{DocumentError, MenuError};
pub use models::{
    slugify,
    // Context flags
    ContextFlag,
    FunctionCall,
    ItemType,
    Menu,
    MenuItem,
    MenuItemKind,
    MenuType,
    RequestContext,
    LOGIN_ROOT_MENU_ID,
    LOGIN_SETTINGS_MENU_ID,
    ROOT_MENU_ID,
};
pub use registry::{
    default_function_options, function_rule_note, FunctionOption, FunctionRegistry,
    ServiceDefinition, Weblink, WeblinkContext, WeblinkRegistry,
};
pub use session::EditingSession;
pub use storage::{
    export_session, open_session, save_session, DocumentStorage, LoadedSession, SkippedDocument,
};
pub use store::{MenuTreeStore, RetypeDefaults};
