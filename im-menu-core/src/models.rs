use serde::{Deserialize, Serialize};
use std::fmt;

/// Root menu id of the business forest
pub const ROOT_MENU_ID: &str = "home";

/// Root menu id of the login forest
pub const LOGIN_ROOT_MENU_ID: &str = "login-home";

/// Id of the settings menu the legacy login format expands into
pub const LOGIN_SETTINGS_MENU_ID: &str = "login-settings";

/// Display name given to a root menu that has none
pub const ROOT_MENU_NAME: &str = "Home";

/// The two independent menu forests of the bot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MenuType {
    Business,
    Login,
}

impl MenuType {
    /// Id of the distinguished root menu of this forest
    pub fn root_id(&self) -> &'static str {
        match self {
            MenuType::Business => ROOT_MENU_ID,
            MenuType::Login => LOGIN_ROOT_MENU_ID,
        }
    }

    /// Prefix used when an incoming menu id has to be rewritten
    pub fn id_prefix(&self) -> &'static str {
        match self {
            MenuType::Business => "business",
            MenuType::Login => "login",
        }
    }

    /// Parse a menu type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "business" => Some(MenuType::Business),
            "login" => Some(MenuType::Login),
            _ => None,
        }
    }
}

impl fmt::Display for MenuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuType::Business => write!(f, "business"),
            MenuType::Login => write!(f, "login"),
        }
    }
}

/// Discriminant of a [`MenuItemKind`], matching the `type` string of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Function,
    FunctionMenu,
    Submenu,
    Weblink,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Function => "function",
            ItemType::FunctionMenu => "function-menu",
            ItemType::Submenu => "submenu",
            ItemType::Weblink => "weblink",
        }
    }

    /// Parse an item type from its document string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "function" => Some(ItemType::Function),
            "function-menu" | "function_menu" => Some(ItemType::FunctionMenu),
            "submenu" => Some(ItemType::Submenu),
            "weblink" => Some(ItemType::Weblink),
            _ => None,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One request-context flag attached to a function call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextFlag {
    pub enabled: bool,
    pub key: String,
    pub label: String,
}

/// Account, service and menu context sent along with a function call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub account: ContextFlag,
    pub service: ContextFlag,
    pub menu: ContextFlag,
}

/// A backend action invoked by a menu item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    /// Id of the entry in the function registry
    pub function_id: String,
    /// Prefer the function's translation key over the literal label
    pub use_translation: bool,
    pub context: RequestContext,
}

impl FunctionCall {
    pub fn new(function_id: impl Into<String>) -> Self {
        Self {
            function_id: function_id.into(),
            use_translation: true,
            context: RequestContext::default(),
        }
    }
}

/// What a menu item does when selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItemKind {
    /// Invoke a backend function
    Function { call: FunctionCall },
    /// Invoke a function, then open a submenu showing its results
    FunctionMenu { call: FunctionCall, submenu_id: String },
    /// Navigate into another menu
    Submenu { submenu_id: String },
    /// Open a named entry of the weblink registry
    Weblink { weblink: String },
}

impl MenuItemKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            MenuItemKind::Function { .. } => ItemType::Function,
            MenuItemKind::FunctionMenu { .. } => ItemType::FunctionMenu,
            MenuItemKind::Submenu { .. } => ItemType::Submenu,
            MenuItemKind::Weblink { .. } => ItemType::Weblink,
        }
    }

    /// Submenu claimed by this item, if any
    pub fn submenu_id(&self) -> Option<&str> {
        match self {
            MenuItemKind::FunctionMenu { submenu_id, .. } | MenuItemKind::Submenu { submenu_id } => {
                Some(submenu_id)
            }
            _ => None,
        }
    }

    pub fn call(&self) -> Option<&FunctionCall> {
        match self {
            MenuItemKind::Function { call } | MenuItemKind::FunctionMenu { call, .. } => Some(call),
            _ => None,
        }
    }
}

/// One row inside a menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    pub kind: MenuItemKind,
}

/// A named node of a menu forest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub id: String,
    pub name: String,
    /// Menu whose item currently claims this one as submenu
    pub parent_id: Option<String>,
    pub items: Vec<MenuItem>,
}

impl Menu {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            items: Vec::new(),
        }
    }

    /// Whether any item of this menu links to `submenu_id`
    pub fn references(&self, submenu_id: &str) -> bool {
        self.items
            .iter()
            .any(|item| item.kind.submenu_id() == Some(submenu_id))
    }
}

/// Derive a lowercase, hyphenated identifier from a display name
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Capitalize each `-`, `_` or whitespace separated word
pub fn title_case(value: &str) -> String {
    value
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Billing"), "billing");
        assert_eq!(slugify("  My Account / Plans "), "my-account-plans");
        assert_eq!(slugify("--Top--Up--"), "top-up");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("check_balance"), "Check Balance");
        assert_eq!(title_case("top-up now"), "Top Up Now");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_item_type_parse() {
        assert_eq!(ItemType::parse("function-menu"), Some(ItemType::FunctionMenu));
        assert_eq!(ItemType::parse("Submenu"), Some(ItemType::Submenu));
        assert_eq!(ItemType::parse("other"), None);
    }

    #[test]
    fn test_menu_type_roots() {
        assert_eq!(MenuType::Business.root_id(), ROOT_MENU_ID);
        assert_eq!(MenuType::Login.root_id(), LOGIN_ROOT_MENU_ID);
        assert_eq!(MenuType::parse("LOGIN"), Some(MenuType::Login));
        assert_eq!(MenuType::Business.to_string(), "business");
    }
}
