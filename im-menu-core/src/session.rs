//! Editing session over both menu forests

use chrono::{SecondsFormat, Utc};

use crate::document::{
    extract_login_menus, legacy_login_sections, wrap_legacy_business_menu, IncomingDocument,
    LoginMenuDocument, MenuDocument, DOCUMENT_VERSION,
};
use crate::error::{DocumentError, MenuError};
use crate::models::{FunctionCall, ItemType, MenuItemKind, MenuType};
use crate::registry::{FunctionRegistry, WeblinkRegistry};
use crate::store::{MenuTreeStore, RetypeDefaults};

/// Owns the business and login forests plus the registries items refer to.
///
/// Exactly one forest is active at a time; switching only changes which
/// store the editing calls reach.
#[derive(Debug, Clone)]
pub struct EditingSession {
    business: MenuTreeStore,
    login: MenuTreeStore,
    active_type: MenuType,
    functions: FunctionRegistry,
    weblinks: WeblinkRegistry,
}

impl EditingSession {
    /// Creates a session seeded with the built-in structure for both forests
    pub fn new(functions: FunctionRegistry, weblinks: WeblinkRegistry) -> Self {
        let mut functions = functions;
        let business = MenuTreeStore::from_document_menus(MenuType::Business, &[], &mut functions);
        let login = MenuTreeStore::from_document_menus(MenuType::Login, &[], &mut functions);
        Self {
            business,
            login,
            active_type: MenuType::Business,
            functions,
            weblinks,
        }
    }

    pub fn active_type(&self) -> MenuType {
        self.active_type
    }

    pub fn switch_menu_type(&mut self, menu_type: MenuType) {
        if self.active_type != menu_type {
            tracing::debug!(from = %self.active_type, to = %menu_type, "switching menu forest");
            self.active_type = menu_type;
        }
    }

    /// The forest currently being edited
    pub fn active(&self) -> &MenuTreeStore {
        self.store(self.active_type)
    }

    pub fn active_mut(&mut self) -> &mut MenuTreeStore {
        match self.active_type {
            MenuType::Business => &mut self.business,
            MenuType::Login => &mut self.login,
        }
    }

    pub fn store(&self, menu_type: MenuType) -> &MenuTreeStore {
        match menu_type {
            MenuType::Business => &self.business,
            MenuType::Login => &self.login,
        }
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn weblinks(&self) -> &WeblinkRegistry {
        &self.weblinks
    }

    // =========================================================================
    // Registry-aware editing
    // =========================================================================

    /// Appends an item to a menu of the active forest after checking that its
    /// function and weblink exist
    pub fn add_item(
        &mut self,
        menu_id: &str,
        label: &str,
        kind: MenuItemKind,
    ) -> Result<String, MenuError> {
        self.validate_kind(&kind)?;
        self.active_mut().add_item(menu_id, label, kind)
    }

    /// Changes an item's type, filling the new variant from the registries.
    ///
    /// Function types keep the item's current function when it is still
    /// registered and otherwise take the first registered one.
    pub fn change_item_type(
        &mut self,
        menu_id: &str,
        index: usize,
        new_type: ItemType,
    ) -> Result<(), MenuError> {
        let item = self.active().item(menu_id, index)?;
        let function_id = item
            .kind
            .call()
            .map(|call| call.function_id.clone())
            .filter(|id| self.functions.contains(id))
            .or_else(|| self.functions.first().map(|f| f.id.clone()))
            .unwrap_or_default();
        let weblink = match &item.kind {
            MenuItemKind::Weblink { weblink } => weblink.clone(),
            _ => self
                .weblinks
                .first()
                .map(|l| l.name.clone())
                .unwrap_or_default(),
        };

        match new_type {
            ItemType::Function | ItemType::FunctionMenu if function_id.is_empty() => {
                return Err(MenuError::UnknownFunction(function_id));
            }
            ItemType::Weblink if weblink.is_empty() => {
                return Err(MenuError::UnknownWeblink(weblink));
            }
            _ => {}
        }

        let defaults = RetypeDefaults {
            function_id,
            weblink,
        };
        self.active_mut()
            .change_item_type(menu_id, index, new_type, &defaults)
    }

    /// Replaces the function call of an existing function or function-menu
    /// item. The function must be registered.
    pub fn set_item_call(
        &mut self,
        menu_id: &str,
        index: usize,
        call: FunctionCall,
    ) -> Result<(), MenuError> {
        if !self.functions.contains(&call.function_id) {
            return Err(MenuError::UnknownFunction(call.function_id));
        }
        self.active_mut().set_item_call(menu_id, index, call)
    }

    /// Points an existing weblink item at another configured link
    pub fn set_item_weblink(
        &mut self,
        menu_id: &str,
        index: usize,
        name: &str,
    ) -> Result<(), MenuError> {
        self.validate_kind(&MenuItemKind::Weblink {
            weblink: name.to_string(),
        })?;
        self.active_mut().set_item_weblink(menu_id, index, name)
    }

    fn validate_kind(&self, kind: &MenuItemKind) -> Result<(), MenuError> {
        if let Some(call) = kind.call() {
            if !self.functions.contains(&call.function_id) {
                return Err(MenuError::UnknownFunction(call.function_id.clone()));
            }
        }
        if let MenuItemKind::Weblink { weblink } = kind {
            if self.weblinks.find(weblink).is_none() {
                return Err(MenuError::UnknownWeblink(weblink.clone()));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Documents
    // =========================================================================

    /// Serializes both forests into a fresh document
    pub fn to_document(&self) -> MenuDocument {
        let login_menus = self.login.to_document_menus(&self.functions, &self.weblinks);
        let (menu, settings_menu) = legacy_login_sections(&login_menus);
        MenuDocument {
            version: DOCUMENT_VERSION,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            login_menu: LoginMenuDocument {
                menus: login_menus,
                menu,
                settings_menu,
            },
            menus: self.business.to_document_menus(&self.functions, &self.weblinks),
        }
    }

    /// Pretty-printed JSON of [`Self::to_document`]
    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(&self.to_document())
            .map_err(|e| DocumentError::Serialize(e.to_string()))
    }

    /// Replaces both forests with the contents of a document.
    ///
    /// Missing sections fall back to their legacy shape and then to the
    /// built-in structure. The active forest type is kept.
    pub fn load_document(&mut self, document: &IncomingDocument) {
        let business_menus = match (&document.menus, &document.menu) {
            (Some(menus), _) => menus.clone(),
            (None, Some(items)) => {
                tracing::info!("using legacy business menu definition");
                wrap_legacy_business_menu(items)
            }
            (None, None) => Vec::new(),
        };
        let login_menus = document
            .login_menu
            .as_ref()
            .and_then(extract_login_menus)
            .unwrap_or_default();

        self.business =
            MenuTreeStore::from_document_menus(MenuType::Business, &business_menus, &mut self.functions);
        self.login =
            MenuTreeStore::from_document_menus(MenuType::Login, &login_menus, &mut self.functions);
    }

    /// Parses and loads a JSON document. Fields of the wrong type read as
    /// absent; on malformed JSON the session is left as it was.
    pub fn import_json(&mut self, text: &str) -> Result<(), DocumentError> {
        let document = IncomingDocument::from_json(text)?;
        self.load_document(&document);
        Ok(())
    }

    /// Replaces both forests with the built-in structure
    pub fn reset_to_default(&mut self) {
        self.load_document(&IncomingDocument::default());
    }

    /// Export needs at least one item on the active root menu
    pub fn ensure_exportable(&self) -> Result<(), MenuError> {
        if self.active().root().items.is_empty() {
            return Err(MenuError::EmptyRootMenu);
        }
        Ok(())
    }
}

impl Default for EditingSession {
    fn default() -> Self {
        Self::new(FunctionRegistry::new(), WeblinkRegistry::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContextFlag, ROOT_MENU_ID};
    use crate::registry::{Weblink, WeblinkContext};

    fn session_with_portal() -> EditingSession {
        let mut weblinks = WeblinkRegistry::new();
        weblinks.upsert(Weblink {
            name: "portal".into(),
            url: "https://portal.example.com".into(),
            authenticated: false,
            context: WeblinkContext::NoContext,
        });
        EditingSession::new(FunctionRegistry::new(), weblinks)
    }

    fn without_timestamp(mut document: MenuDocument) -> MenuDocument {
        document.generated_at.clear();
        document
    }

    #[test]
    fn test_new_session_uses_default_structure() {
        let session = EditingSession::default();
        assert_eq!(session.active_type(), MenuType::Business);
        assert_eq!(session.active().root().items.len(), 6);
        assert_eq!(session.store(MenuType::Login).root().items.len(), 3);
    }

    #[test]
    fn test_switch_menu_type_keeps_both_forests() {
        let mut session = EditingSession::default();
        session.active_mut().create_menu("Billing").unwrap();
        session.switch_menu_type(MenuType::Login);
        assert!(!session.active().contains("billing"));
        session.switch_menu_type(MenuType::Business);
        assert!(session.active().contains("billing"));
    }

    #[test]
    fn test_add_item_validates_registries() {
        let mut session = session_with_portal();
        let unknown = session.add_item(
            ROOT_MENU_ID,
            "Top up",
            MenuItemKind::Function {
                call: FunctionCall::new("TOP_UP"),
            },
        );
        assert_eq!(unknown, Err(MenuError::UnknownFunction("TOP_UP".into())));

        let missing_link = session.add_item(
            ROOT_MENU_ID,
            "Docs",
            MenuItemKind::Weblink {
                weblink: "docs".into(),
            },
        );
        assert_eq!(missing_link, Err(MenuError::UnknownWeblink("docs".into())));

        session
            .add_item(
                ROOT_MENU_ID,
                "Portal",
                MenuItemKind::Weblink {
                    weblink: "portal".into(),
                },
            )
            .unwrap();
        assert_eq!(session.active().root().items.len(), 7);
    }

    #[test]
    fn test_set_item_call_checks_registry() {
        let mut session = session_with_portal();
        assert_eq!(
            session.set_item_call(ROOT_MENU_ID, 0, FunctionCall::new("TOP_UP")),
            Err(MenuError::UnknownFunction("TOP_UP".into()))
        );
        assert_eq!(
            session.active().root().items[0].kind.call().unwrap().function_id,
            "HELLO_WORLD"
        );

        let mut call = FunctionCall::new("MY_ISSUES");
        call.use_translation = false;
        call.context.account = ContextFlag {
            enabled: true,
            key: "accountId".into(),
            label: "Account".into(),
        };
        session.set_item_call(ROOT_MENU_ID, 0, call.clone()).unwrap();
        assert_eq!(session.active().root().items[0].kind.call(), Some(&call));
    }

    #[test]
    fn test_set_item_weblink_checks_registry() {
        let mut session = session_with_portal();
        session
            .add_item(
                ROOT_MENU_ID,
                "Portal",
                MenuItemKind::Weblink {
                    weblink: "portal".into(),
                },
            )
            .unwrap();

        assert_eq!(
            session.set_item_weblink(ROOT_MENU_ID, 6, "docs"),
            Err(MenuError::UnknownWeblink("docs".into()))
        );
        assert!(matches!(
            session.set_item_weblink(ROOT_MENU_ID, 0, "portal"),
            Err(MenuError::ItemTypeMismatch { .. })
        ));
        session.set_item_weblink(ROOT_MENU_ID, 6, "portal").unwrap();
    }

    #[test]
    fn test_change_item_type_uses_registry_defaults() {
        let mut session = session_with_portal();
        session.change_item_type(ROOT_MENU_ID, 0, ItemType::Weblink).unwrap();
        assert_eq!(
            session.active().root().items[0].kind,
            MenuItemKind::Weblink {
                weblink: "portal".into()
            }
        );

        session.change_item_type(ROOT_MENU_ID, 0, ItemType::Function).unwrap();
        let call = session.active().root().items[0].kind.call().unwrap();
        assert_eq!(call.function_id, "HELLO_WORLD");
    }

    #[test]
    fn test_change_item_type_to_weblink_without_links() {
        let mut session = EditingSession::default();
        assert_eq!(
            session.change_item_type(ROOT_MENU_ID, 0, ItemType::Weblink),
            Err(MenuError::UnknownWeblink(String::new()))
        );
    }

    #[test]
    fn test_document_shape() {
        let session = EditingSession::default();
        let json: serde_json::Value = serde_json::from_str(&session.to_json().unwrap()).unwrap();

        assert_eq!(json["version"], 1);
        let generated_at = json["generatedAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(generated_at).is_ok());
        assert!(generated_at.ends_with('Z'));
        assert_eq!(json["menus"][0]["id"], "home");
        assert_eq!(json["menus"][0]["parentId"], serde_json::Value::Null);
        assert_eq!(json["loginMenu"]["menus"][0]["id"], "login-home");
        assert_eq!(json["loginMenu"]["menu"].as_array().unwrap().len(), 2);
        assert_eq!(json["loginMenu"]["settingsMenu"].as_array().unwrap().len(), 3);

        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_to_document_is_idempotent() {
        let session = session_with_portal();
        let first = without_timestamp(session.to_document());
        let second = without_timestamp(session.to_document());
        assert_eq!(first, second);
    }

    #[test]
    fn test_import_of_export_reproduces_document() {
        let mut session = session_with_portal();
        let plans = session.active_mut().create_menu("Plans").unwrap();
        session
            .add_item(
                ROOT_MENU_ID,
                "Plans",
                MenuItemKind::FunctionMenu {
                    call: FunctionCall::new("SELECT_SERVICE"),
                    submenu_id: plans.clone(),
                },
            )
            .unwrap();
        session
            .add_item(
                &plans,
                "Portal",
                MenuItemKind::Weblink {
                    weblink: "portal".into(),
                },
            )
            .unwrap();
        let exported = without_timestamp(session.to_document());

        let mut reloaded = session_with_portal();
        reloaded.import_json(&session.to_json().unwrap()).unwrap();
        assert_eq!(without_timestamp(reloaded.to_document()), exported);
    }

    #[test]
    fn test_import_legacy_flat_menu() {
        let mut session = EditingSession::default();
        session
            .import_json(r#"{"menu": [{"label": "X", "function": "HELLO_WORLD"}]}"#)
            .unwrap();

        let store = session.store(MenuType::Business);
        assert_eq!(store.len(), 1);
        assert_eq!(store.root().items.len(), 1);
        assert_eq!(store.root().items[0].label, "X");
        assert_eq!(store.root().items[0].kind.item_type(), ItemType::Function);
    }

    #[test]
    fn test_import_tolerates_off_type_fields() {
        let mut session = EditingSession::default();
        session
            .import_json(
                r#"{
                    "menus": {},
                    "menu": [
                        {"label": "Odd", "function": "MY_ISSUES", "useTranslation": "yes"},
                        {"id": 7},
                        {"label": 12, "function": "HELLO_WORLD", "menuContextEnabled": 1},
                        "not an item"
                    ],
                    "loginMenu": []
                }"#,
            )
            .unwrap();

        let items = &session.store(MenuType::Business).root().items;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].label, "Odd");
        assert!(items[0].kind.call().unwrap().use_translation);
        assert_eq!(items[1].kind.call().unwrap().function_id, "7");
        assert_eq!(items[2].label, "12");
        assert!(items[2].kind.call().unwrap().context.menu.enabled);
        assert!(session.functions().contains("7"));

        assert_eq!(session.store(MenuType::Login).root().items.len(), 3);
    }

    #[test]
    fn test_import_of_non_object_uses_defaults() {
        let mut session = EditingSession::default();
        session.active_mut().create_menu("Billing").unwrap();
        session.import_json("[1, 2, 3]").unwrap();
        assert!(!session.active().contains("billing"));
        assert_eq!(session.active().root().items.len(), 6);
    }

    #[test]
    fn test_import_parse_failure_leaves_session() {
        let mut session = EditingSession::default();
        session.active_mut().create_menu("Billing").unwrap();

        let result = session.import_json("{ not json");
        assert!(matches!(result, Err(DocumentError::Parse(_))));
        assert!(session.active().contains("billing"));
    }

    #[test]
    fn test_reset_to_default() {
        let mut session = EditingSession::default();
        session.switch_menu_type(MenuType::Login);
        session.active_mut().create_menu("Extra").unwrap();
        session.reset_to_default();

        assert_eq!(session.active_type(), MenuType::Login);
        assert!(!session.active().contains("extra"));
        assert_eq!(session.active().len(), 2);
    }

    #[test]
    fn test_ensure_exportable() {
        let mut session = EditingSession::default();
        assert!(session.ensure_exportable().is_ok());

        session.import_json(r#"{"menus": [{"id": "home", "items": []}]}"#).unwrap();
        assert_eq!(session.ensure_exportable(), Err(MenuError::EmptyRootMenu));
    }
}
