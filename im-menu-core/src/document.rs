//! The versioned menu configuration document
//!
//! Outgoing types ([`MenuDocument`] and friends) describe exactly what is
//! written. Incoming types ([`IncomingDocument`] and friends) are lenient:
//! every field is optional so that older and hand-edited files still load.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::DocumentError;
use crate::models::{
    slugify, ContextFlag, FunctionCall, ItemType, MenuItem, MenuItemKind, MenuType,
    RequestContext, LOGIN_SETTINGS_MENU_ID, ROOT_MENU_NAME,
};
use crate::registry::{FunctionOption, FunctionRegistry, WeblinkRegistry};
use crate::store::MenuTreeStore;

/// Version number written into every document
pub const DOCUMENT_VERSION: u32 = 1;

// =============================================================================
// Lenient field readers
// =============================================================================
//
// Hand-edited documents often hold values of the wrong JSON type. Those
// read as absent instead of failing the whole document.

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "y" | "yes" | "1" => Some(true),
            "false" | "n" | "no" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(truthy(&Value::deserialize(deserializer)?))
}

fn lenient_enabled<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_flag(deserializer)?.unwrap_or(false))
}

/// A non-array reads as absent; elements that are not objects are skipped
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(values) => Ok(Some(
            values
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|value| serde_json::from_value(value).ok())
                .collect(),
        )),
        Value::Null => Ok(None),
        other => {
            tracing::warn!(found = %json_kind(&other), "ignoring non-array list in document");
            Ok(None)
        }
    }
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => Ok(serde_json::from_value(value).ok()),
        _ => Ok(None),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Request-context columns carried by function items
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContextFields {
    #[serde(default, deserialize_with = "lenient_enabled")]
    pub account_context_enabled: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub account_context_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub account_context_label: Option<String>,
    #[serde(default, deserialize_with = "lenient_enabled")]
    pub service_context_enabled: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub service_context_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub service_context_label: Option<String>,
    #[serde(default, deserialize_with = "lenient_enabled")]
    pub menu_context_enabled: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub menu_context_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub menu_context_label: Option<String>,
}

fn none_if_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Written as-is; only the empty string becomes `null`
fn present(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn flag(enabled: bool, key: &Option<String>, label: &Option<String>) -> ContextFlag {
    ContextFlag {
        enabled,
        key: key.clone().unwrap_or_default(),
        label: label.clone().unwrap_or_default(),
    }
}

impl From<&RequestContext> for ContextFields {
    fn from(context: &RequestContext) -> Self {
        Self {
            account_context_enabled: context.account.enabled,
            account_context_key: present(&context.account.key),
            account_context_label: present(&context.account.label),
            service_context_enabled: context.service.enabled,
            service_context_key: present(&context.service.key),
            service_context_label: present(&context.service.label),
            menu_context_enabled: context.menu.enabled,
            menu_context_key: present(&context.menu.key),
            menu_context_label: present(&context.menu.label),
        }
    }
}

impl From<&ContextFields> for RequestContext {
    fn from(fields: &ContextFields) -> Self {
        Self {
            account: flag(
                fields.account_context_enabled,
                &fields.account_context_key,
                &fields.account_context_label,
            ),
            service: flag(
                fields.service_context_enabled,
                &fields.service_context_key,
                &fields.service_context_label,
            ),
            menu: flag(
                fields.menu_context_enabled,
                &fields.menu_context_key,
                &fields.menu_context_label,
            ),
        }
    }
}

/// Weblink columns resolved from the weblink registry
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WeblinkFields {
    pub weblink: Option<String>,
    pub url: Option<String>,
    pub authenticated: bool,
    pub context: String,
}

/// One item as written to the document
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem {
    /// 1-based position inside the menu
    pub order: usize,
    #[serde(rename = "type")]
    pub item_type: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_translation: Option<bool>,
    pub function: Option<String>,
    pub callback_data: Option<String>,
    pub translation_key: Option<String>,
    pub submenu_id: Option<String>,
    #[serde(flatten)]
    pub context: Option<ContextFields>,
    #[serde(flatten)]
    pub weblink: Option<WeblinkFields>,
}

/// One menu as written to the document
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMenu {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub items: Vec<DocumentItem>,
}

/// Item shape of the legacy flat `menu` / `settingsMenu` arrays
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyItem {
    pub order: usize,
    pub label: String,
    pub function: Option<String>,
    pub callback_data: Option<String>,
    pub translation_key: Option<String>,
}

/// Login forest plus its legacy projection
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginMenuDocument {
    pub menus: Vec<DocumentMenu>,
    pub menu: Vec<LegacyItem>,
    pub settings_menu: Vec<LegacyItem>,
}

/// The complete configuration document handed to the bot server
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MenuDocument {
    pub version: u32,
    pub generated_at: String,
    pub login_menu: LoginMenuDocument,
    pub menus: Vec<DocumentMenu>,
}

/// A document as read from disk or an import
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingDocument {
    #[serde(default, deserialize_with = "lenient_list")]
    pub menus: Option<Vec<IncomingMenu>>,
    /// Legacy flat item list of the business root menu
    #[serde(default, deserialize_with = "lenient_list")]
    pub menu: Option<Vec<IncomingItem>>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub login_menu: Option<IncomingLoginMenu>,
}

impl IncomingDocument {
    /// Parses document text. Only malformed JSON is an error; a top-level
    /// value that is not an object reads as an empty document.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| DocumentError::Parse(e.to_string()))?;
        if !value.is_object() {
            tracing::warn!(found = %json_kind(&value), "menu document is not an object");
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| DocumentError::Parse(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingLoginMenu {
    #[serde(default, deserialize_with = "lenient_list")]
    pub menus: Option<Vec<IncomingMenu>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub menu: Option<Vec<IncomingItem>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub settings_menu: Option<Vec<IncomingItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMenu {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub items: Option<Vec<IncomingItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingItem {
    /// Legacy items name their function here
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub label: Option<String>,
    /// Raw `type` string; unrecognised values still count as explicit
    #[serde(default, rename = "type", deserialize_with = "lenient_text")]
    pub item_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub function: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub callback_data: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub translation_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub submenu_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub use_translation: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub weblink: Option<String>,
    #[serde(flatten)]
    pub context: ContextFields,
}

impl IncomingItem {
    fn function(label: &str, function_id: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            item_type: Some(ItemType::Function.as_str().to_string()),
            function: Some(function_id.to_string()),
            use_translation: Some(true),
            ..Self::default()
        }
    }

    fn submenu(label: &str, submenu_id: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            item_type: Some(ItemType::Submenu.as_str().to_string()),
            submenu_id: Some(submenu_id.to_string()),
            ..Self::default()
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().and_then(none_if_empty)
}

/// The built-in structure a forest falls back to when no document provides one
pub fn default_structure(menu_type: MenuType) -> Vec<IncomingMenu> {
    let root_id = menu_type.root_id();
    let (settings_id, root_items) = match menu_type {
        MenuType::Business => (
            "settings",
            vec![
                IncomingItem::function("Hello World", "HELLO_WORLD"),
                IncomingItem::function("Hello Cerillion", "HELLO_CERILLION"),
                IncomingItem::function("Trouble Ticket", "VIEW_TROUBLE_TICKET"),
                IncomingItem::function("Select a Service", "SELECT_SERVICE"),
                IncomingItem::function("My Issues", "MY_ISSUES"),
                IncomingItem::submenu("Settings", "settings"),
            ],
        ),
        MenuType::Login => (
            LOGIN_SETTINGS_MENU_ID,
            vec![
                IncomingItem::function("Self-service login", "DIGITAL_LOGIN"),
                IncomingItem::function("Direct login", "CRM_LOGIN"),
                IncomingItem::submenu("Settings", LOGIN_SETTINGS_MENU_ID),
            ],
        ),
    };

    vec![
        IncomingMenu {
            id: Some(root_id.to_string()),
            name: Some(ROOT_MENU_NAME.to_string()),
            parent_id: None,
            items: Some(root_items),
        },
        IncomingMenu {
            id: Some(settings_id.to_string()),
            name: Some("Settings".to_string()),
            parent_id: Some(root_id.to_string()),
            items: Some(vec![
                IncomingItem::function("Consent management", "OPT_IN"),
                IncomingItem::function("Language settings", "CHANGE_LANGUAGE"),
                IncomingItem::function("Back to menu", "MENU"),
            ]),
        },
    ]
}

/// Expands the legacy login `menu` / `settingsMenu` pair, preferring nested `menus`
pub fn extract_login_menus(login: &IncomingLoginMenu) -> Option<Vec<IncomingMenu>> {
    if let Some(menus) = login.menus.as_ref().filter(|m| !m.is_empty()) {
        return Some(menus.clone());
    }

    let legacy_menu = login.menu.as_ref().filter(|m| !m.is_empty());
    let legacy_settings = login.settings_menu.as_ref().filter(|m| !m.is_empty());
    if legacy_menu.is_none() && legacy_settings.is_none() {
        return None;
    }

    tracing::info!("using legacy login menu definition");
    let root_id = MenuType::Login.root_id();
    let mut menus = Vec::new();
    if let Some(items) = legacy_menu {
        menus.push(IncomingMenu {
            id: Some(root_id.to_string()),
            name: Some(ROOT_MENU_NAME.to_string()),
            parent_id: None,
            items: Some(items.clone()),
        });
    }
    if let Some(items) = legacy_settings {
        menus.push(IncomingMenu {
            id: Some(LOGIN_SETTINGS_MENU_ID.to_string()),
            name: Some("Settings".to_string()),
            parent_id: Some(root_id.to_string()),
            items: Some(items.clone()),
        });
    }
    Some(menus)
}

/// Wraps the legacy flat business `menu` array into a root menu
pub fn wrap_legacy_business_menu(items: &[IncomingItem]) -> Vec<IncomingMenu> {
    vec![IncomingMenu {
        id: Some(MenuType::Business.root_id().to_string()),
        name: Some(ROOT_MENU_NAME.to_string()),
        parent_id: None,
        items: Some(items.to_vec()),
    }]
}

impl MenuTreeStore {
    /// Builds a forest from the `menus` array of a document.
    ///
    /// Menu shells are created first so items may reference menus declared
    /// after them. Unknown functions are registered as placeholders, links
    /// that break the tree rules are demoted or dropped, and an empty input
    /// yields the built-in structure.
    pub fn from_document_menus(
        menu_type: MenuType,
        menus: &[IncomingMenu],
        functions: &mut FunctionRegistry,
    ) -> Self {
        if menus.is_empty() {
            return Self::from_document_menus(menu_type, &default_structure(menu_type), functions);
        }

        let mut store = Self::empty(menu_type);
        store.set_menu_counter(menus.len() as u32);

        let mut resolved = Vec::with_capacity(menus.len());
        for menu in menus {
            let name_hint = menu.name.clone().unwrap_or_default();
            let base = non_empty(&menu.id).or_else(|| none_if_empty(&slugify(&name_hint)));
            let id = match base {
                Some(id) if !store.contains(&id) => id,
                other => prefixed_menu_id(&mut store, other, &name_hint),
            };
            let name = non_empty(&menu.name).unwrap_or_else(|| {
                if menu.id.as_deref() == Some(menu_type.root_id()) {
                    ROOT_MENU_NAME.to_string()
                } else {
                    non_empty(&menu.id).unwrap_or_else(|| "Menu".to_string())
                }
            });
            store.insert_shell(id.clone(), name);
            resolved.push(id);
        }
        store.ensure_root();

        for (menu, menu_id) in menus.iter().zip(&resolved) {
            for item in menu.items.iter().flatten() {
                add_incoming_item(&mut store, menu_id, item, functions);
            }
        }

        // Menus no item claims keep the parent the document declares, when valid
        for (menu, menu_id) in menus.iter().zip(&resolved) {
            let Some(parent) = non_empty(&menu.parent_id) else {
                continue;
            };
            if store.menu(menu_id).is_some_and(|m| m.parent_id.is_some()) {
                continue;
            }
            if let Err(error) = store.link_submenu(&parent, menu_id) {
                tracing::debug!(%menu_id, %parent, %error, "ignoring declared parent");
            }
        }

        tracing::info!(%menu_type, menus = store.len(), "loaded menu forest");
        store
    }

    /// Serializes the forest into the document's `menus` array
    pub fn to_document_menus(
        &self,
        functions: &FunctionRegistry,
        weblinks: &WeblinkRegistry,
    ) -> Vec<DocumentMenu> {
        self.menus()
            .map(|menu| DocumentMenu {
                id: menu.id.clone(),
                name: menu.name.clone(),
                parent_id: menu.parent_id.clone(),
                items: menu
                    .items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| document_item(index + 1, item, functions, weblinks))
                    .collect(),
            })
            .collect()
    }
}

fn prefixed_menu_id(store: &mut MenuTreeStore, base: Option<String>, name: &str) -> String {
    let base = base.unwrap_or_else(|| {
        let hint = if name.trim().is_empty() { "menu" } else { name };
        store.next_menu_id(hint)
    });
    let prefixed = format!("{}-{}", store.menu_type().id_prefix(), base);
    let mut candidate = prefixed.clone();
    let mut suffix = 1;
    while store.contains(&candidate) {
        candidate = format!("{}-{}", prefixed, suffix);
        suffix += 1;
    }
    candidate
}

fn incoming_call(item: &IncomingItem, function_id: &str) -> FunctionCall {
    FunctionCall {
        function_id: function_id.to_string(),
        use_translation: item
            .use_translation
            .unwrap_or_else(|| item.translation_key.is_some()),
        context: RequestContext::from(&item.context),
    }
}

/// Registers a placeholder for a function the registry does not know
fn ensure_function(functions: &mut FunctionRegistry, item: &IncomingItem, function_id: &str) {
    if functions.contains(function_id) {
        return;
    }
    tracing::warn!(%function_id, "registering placeholder for unknown function");
    functions.register(FunctionOption {
        id: function_id.to_string(),
        label: non_empty(&item.label).unwrap_or_else(|| function_id.to_string()),
        callback_data: non_empty(&item.callback_data).unwrap_or_else(|| function_id.to_string()),
        translation_key: non_empty(&item.translation_key),
        description: String::new(),
    });
}

/// Classifies one document item and appends it, trying a demoted form when
/// the preferred one is rejected
fn add_incoming_item(
    store: &mut MenuTreeStore,
    menu_id: &str,
    item: &IncomingItem,
    functions: &mut FunctionRegistry,
) {
    let raw_type = non_empty(&item.item_type);
    let explicit = raw_type.as_deref().and_then(ItemType::parse);
    if let (Some(raw), None) = (&raw_type, explicit) {
        tracing::warn!(%menu_id, item_type = %raw, "unrecognised item type");
    }
    let submenu = item
        .submenu_id
        .as_deref()
        .filter(|id| store.contains(id))
        .map(str::to_string);
    let function_id = non_empty(&item.function).or_else(|| non_empty(&item.id));
    let is_weblink = (raw_type.is_none() || explicit == Some(ItemType::Weblink))
        && non_empty(&item.weblink).is_some();
    let label = non_empty(&item.label);

    let mut candidates: Vec<(String, MenuItemKind)> = Vec::new();
    let wants_function_menu = explicit == Some(ItemType::FunctionMenu)
        || (submenu.is_some() && function_id.is_some() && explicit != Some(ItemType::Submenu));

    if wants_function_menu || explicit == Some(ItemType::Submenu) || submenu.is_some() {
        if wants_function_menu {
            if let Some(fid) = &function_id {
                ensure_function(functions, item, fid);
                let call = incoming_call(item, fid);
                let call_label = label
                    .clone()
                    .or_else(|| functions.get(fid).map(|f| f.label.clone()))
                    .unwrap_or_else(|| fid.clone());
                if let Some(sid) = &submenu {
                    candidates.push((
                        call_label.clone(),
                        MenuItemKind::FunctionMenu {
                            call: call.clone(),
                            submenu_id: sid.clone(),
                        },
                    ));
                }
                candidates.push((call_label, MenuItemKind::Function { call }));
            }
        }
        if candidates.is_empty() {
            if let Some(sid) = &submenu {
                let submenu_label = label
                    .clone()
                    .or_else(|| store.menu(sid).map(|m| m.name.clone()))
                    .unwrap_or_else(|| sid.clone());
                candidates.push((
                    submenu_label,
                    MenuItemKind::Submenu {
                        submenu_id: sid.clone(),
                    },
                ));
            }
        }
    } else if is_weblink {
        let weblink = non_empty(&item.weblink).unwrap_or_default();
        let weblink_label = label.clone().unwrap_or_else(|| weblink.clone());
        candidates.push((weblink_label, MenuItemKind::Weblink { weblink }));
    } else if let Some(fid) = &function_id {
        ensure_function(functions, item, fid);
        let call_label = label
            .clone()
            .or_else(|| functions.get(fid).map(|f| f.label.clone()))
            .unwrap_or_else(|| fid.clone());
        candidates.push((
            call_label,
            MenuItemKind::Function {
                call: incoming_call(item, fid),
            },
        ));
    }

    for (candidate_label, kind) in candidates {
        let item_type = kind.item_type();
        match store.add_item(menu_id, &candidate_label, kind) {
            Ok(_) => return,
            Err(error) => {
                tracing::warn!(%menu_id, label = %candidate_label, %item_type, %error, "rejected document item");
            }
        }
    }
    tracing::warn!(%menu_id, label = ?item.label, "dropping document item");
}

fn document_item(
    order: usize,
    item: &MenuItem,
    functions: &FunctionRegistry,
    weblinks: &WeblinkRegistry,
) -> DocumentItem {
    let base = DocumentItem {
        order,
        item_type: item.kind.item_type().as_str().to_string(),
        label: item.label.clone(),
        use_translation: None,
        function: None,
        callback_data: None,
        translation_key: None,
        submenu_id: None,
        context: None,
        weblink: None,
    };

    match &item.kind {
        MenuItemKind::Function { call } => function_columns(base, call, functions),
        MenuItemKind::FunctionMenu { call, submenu_id } => DocumentItem {
            submenu_id: Some(submenu_id.clone()),
            ..function_columns(base, call, functions)
        },
        MenuItemKind::Submenu { submenu_id } => DocumentItem {
            submenu_id: Some(submenu_id.clone()),
            ..base
        },
        MenuItemKind::Weblink { weblink } => {
            let link = weblinks.find(weblink);
            DocumentItem {
                weblink: Some(WeblinkFields {
                    weblink: present(weblink),
                    url: link.and_then(|l| present(&l.url)),
                    authenticated: link.is_some_and(|l| l.authenticated),
                    context: link
                        .map(|l| l.context.as_str())
                        .unwrap_or("noContext")
                        .to_string(),
                }),
                ..base
            }
        }
    }
}

fn function_columns(base: DocumentItem, call: &FunctionCall, functions: &FunctionRegistry) -> DocumentItem {
    let meta = functions.get(&call.function_id);
    DocumentItem {
        use_translation: Some(call.use_translation),
        function: Some(call.function_id.clone()),
        callback_data: Some(
            meta.map(|m| m.callback_data.clone())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| call.function_id.clone()),
        ),
        translation_key: if call.use_translation {
            meta.and_then(|m| m.translation_key.clone())
        } else {
            None
        },
        context: Some(ContextFields::from(&call.context)),
        ..base
    }
}

/// Rebuilds the legacy flat `menu` and `settingsMenu` arrays of the login forest
pub fn legacy_login_sections(login_menus: &[DocumentMenu]) -> (Vec<LegacyItem>, Vec<LegacyItem>) {
    let submenu_type = ItemType::Submenu.as_str();
    let root = login_menus
        .iter()
        .find(|m| m.id == MenuType::Login.root_id())
        .or_else(|| login_menus.first());
    let root_items: &[DocumentItem] = root.map(|m| m.items.as_slice()).unwrap_or_default();

    let settings_id = root_items
        .iter()
        .find(|item| item.item_type == submenu_type)
        .and_then(|item| item.submenu_id.clone());
    let settings_items: &[DocumentItem] = settings_id
        .and_then(|id| login_menus.iter().find(|m| m.id == id))
        .map(|m| m.items.as_slice())
        .unwrap_or_default();

    (legacy_items(root_items), legacy_items(settings_items))
}

fn legacy_items(items: &[DocumentItem]) -> Vec<LegacyItem> {
    items
        .iter()
        .filter(|item| item.item_type != ItemType::Submenu.as_str())
        .enumerate()
        .map(|(index, item)| LegacyItem {
            order: index + 1,
            label: item.label.clone(),
            function: item.function.clone(),
            callback_data: item.callback_data.clone(),
            translation_key: item.translation_key.clone(),
        })
        .collect()
}
