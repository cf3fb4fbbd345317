use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::models::title_case;

/// Metadata of a backend function a menu item can invoke
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionOption {
    pub id: String,
    pub label: String,
    /// Callback payload sent to the bot server; defaults to the id
    pub callback_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_key: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl FunctionOption {
    /// Creates an option whose callback data equals its id
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            callback_data: id.clone(),
            id,
            label: label.into(),
            translation_key: None,
            description: String::new(),
        }
    }

    fn builtin(id: &str, label: &str, callback: &str, key: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            callback_data: callback.to_string(),
            translation_key: Some(key.to_string()),
            description: description.to_string(),
        }
    }
}

/// The functions shipped with the bot server
pub fn default_function_options() -> Vec<FunctionOption> {
    vec![
        FunctionOption::builtin("HELLO_WORLD", "Hello World", "HELLO_WORLD", "ButtonHelloWorld", "Sends the Hello World welcome message."),
        FunctionOption::builtin("HELLO_CERILLION", "Hello Cerillion", "HELLO_CERILLION", "ButtonHelloCerillion", "Sends the Hello Cerillion greeting."),
        FunctionOption::builtin("VIEW_TROUBLE_TICKET", "Trouble Ticket", "VIEW_TROUBLE_TICKET", "ButtonTroubleTicket", "Shows the most recent ticket information."),
        FunctionOption::builtin("SELECT_SERVICE", "Select a Service", "SELECT_SERVICE", "ButtonSelectService", "Displays the list of available services for an account."),
        FunctionOption::builtin("MY_ISSUES", "My Issues", "MY_ISSUES", "ButtonMyIssues", "Lists the tickets associated with the selected account."),
        FunctionOption::builtin("DIGITAL_LOGIN", "Self-service login", "SELF_SERVICE_LOGIN", "ButtonSelfServiceLogin", "Starts the digital self-service login flow."),
        FunctionOption::builtin("CRM_LOGIN", "Direct login", "DIRECT_LOGIN", "ButtonDirectLogin", "Performs a direct CRM login."),
        FunctionOption::builtin("SETTINGS", "Settings", "SETTINGS_MENU", "ButtonSettings", "Opens the settings sub-menu."),
        FunctionOption::builtin("OPT_IN", "Consent management", "OPT_IN", "ButtonOptIn", "Manages user consent preferences."),
        FunctionOption::builtin("CHANGE_LANGUAGE", "Language settings", "CHANGE_LANGUAGE", "ButtonChangeLanguage", "Lets the user pick a language."),
        FunctionOption::builtin("CHANGE_ACCOUNT", "Select a different account", "CHANGE_ACCOUNT", "ButtonChangeAccount", "Allows the user to switch to another available account."),
        FunctionOption::builtin("MENU", "Back to menu", "MENU", "ButtonMenu", "Returns to the previous menu."),
        FunctionOption::builtin("BUSINESS_MENU_UP", "Menu Up", "BUSINESS_MENU_UP", "BusinessMenuUp", "Navigates up one menu level."),
        FunctionOption::builtin("LOGOUT", "Logout", "LOGOUT", "ButtonLogout", "Ends the authenticated session."),
    ]
}

/// Display rule the bot server applies to some functions regardless of the menu layout
pub fn function_rule_note(function_id: &str) -> Option<&'static str> {
    match function_id {
        "LOGOUT" => Some("Logout menu option will be displayed in the menus, when user is logged in"),
        "MENU" => Some("Back to Menu option will be displayed in the menu level 2 and above"),
        "CHANGE_ACCOUNT" => Some(
            "Select a Different Account option will be displayed when users have access to more than one account",
        ),
        "BUSINESS_MENU_UP" => Some("Menu Up option will be displayed in the menus of level 3 and above"),
        _ => None,
    }
}

/// A service-builder definition; each one is exposed as a callable function
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub api_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ServicesFile {
    #[serde(default)]
    services: Vec<ServiceDefinition>,
}

/// Load service definitions from a YAML (or JSON) file with a `services` list
pub fn load_service_definitions<P: AsRef<Path>>(path: P) -> Result<Vec<ServiceDefinition>> {
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read services file: {:?}", path.as_ref()))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: ServicesFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse services file: {:?}", path.as_ref()))?;
    Ok(file.services)
}

/// Lookup table of the functions menu items may invoke
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    options: Vec<FunctionOption>,
    service_ids: HashSet<String>,
}

impl FunctionRegistry {
    /// Creates a registry holding the built-in functions
    pub fn new() -> Self {
        Self::with_options(default_function_options())
    }

    /// Creates a registry from an explicit option list; later duplicates are ignored
    pub fn with_options(options: Vec<FunctionOption>) -> Self {
        let mut registry = Self {
            options: Vec::new(),
            service_ids: HashSet::new(),
        };
        for option in options {
            registry.register(option);
        }
        registry
    }

    /// Registers a function unless one with the same id already exists.
    /// Returns whether the option was added.
    pub fn register(&mut self, option: FunctionOption) -> bool {
        if option.id.is_empty() || self.contains(&option.id) {
            return false;
        }
        self.options.push(option);
        true
    }

    /// Removes a function by id
    pub fn remove(&mut self, id: &str) -> Option<FunctionOption> {
        let index = self.options.iter().position(|o| o.id == id)?;
        self.service_ids.remove(id);
        Some(self.options.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&FunctionOption> {
        self.options.iter().find(|o| o.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// First registered function, used when an item needs some function
    pub fn first(&self) -> Option<&FunctionOption> {
        self.options.first()
    }

    /// All functions sorted by label
    pub fn options(&self) -> Vec<&FunctionOption> {
        let mut sorted: Vec<&FunctionOption> = self.options.iter().collect();
        sorted.sort_by(|a, b| a.label.cmp(&b.label));
        sorted
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Replaces the functions contributed by the service builder
    pub fn sync_service_functions(&mut self, services: &[ServiceDefinition]) {
        let previous: Vec<String> = self.service_ids.drain().collect();
        for id in previous {
            self.remove(&id);
        }

        for service in services {
            let name = service.name.trim();
            if name.is_empty() {
                continue;
            }
            let label = match title_case(name) {
                l if l.is_empty() => name.to_string(),
                l => l,
            };
            let description = if service.api_name.is_empty() {
                "Service Builder function".to_string()
            } else {
                format!("Service Builder function for {}", service.api_name)
            };
            let mut option = FunctionOption::new(name, label);
            option.description = description;
            if self.register(option) {
                self.service_ids.insert(name.to_string());
            }
        }
        tracing::debug!(count = self.service_ids.len(), "synced service builder functions");
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Which request context a weblink is opened with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WeblinkContext {
    Account,
    Service,
    #[default]
    NoContext,
}

impl WeblinkContext {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "account" => WeblinkContext::Account,
            "service" => WeblinkContext::Service,
            _ => WeblinkContext::NoContext,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeblinkContext::Account => "account",
            WeblinkContext::Service => "service",
            WeblinkContext::NoContext => "noContext",
        }
    }
}

impl fmt::Display for WeblinkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named external link a menu item can open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weblink {
    pub name: String,
    pub url: String,
    pub authenticated: bool,
    pub context: WeblinkContext,
}

/// Named weblinks, kept in file order
#[derive(Debug, Clone, Default)]
pub struct WeblinkRegistry {
    links: Vec<Weblink>,
}

impl WeblinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads weblinks from a YAML file; a missing file gives an empty registry
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read weblinks file: {:?}", path.as_ref()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse weblinks file: {:?}", path.as_ref()))
    }

    /// Parses `<name>: {URL, Authenticated-User, Context}` entries
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let root: Value = serde_yaml::from_str(content)?;
        let Value::Mapping(entries) = root else {
            return Ok(Self::new());
        };

        let mut registry = Self::new();
        for (name, meta) in entries {
            let Some(name) = scalar_to_string(&name) else {
                continue;
            };
            let url = lookup(&meta, &["url"]).and_then(scalar_to_string).unwrap_or_default();
            let authenticated = resolve_boolean_flag(
                lookup(&meta, &["authenticated-user", "authenticated"]),
                false,
            );
            let context = lookup(&meta, &["context"])
                .and_then(scalar_to_string)
                .map(|c| WeblinkContext::parse(&c))
                .unwrap_or_default();
            registry.upsert(Weblink {
                name,
                url,
                authenticated,
                context,
            });
        }
        Ok(registry)
    }

    /// Prints the registry in the same layout `from_yaml` reads
    pub fn to_yaml(&self) -> Result<String> {
        let mut root = Mapping::new();
        for link in &self.links {
            let mut meta = Mapping::new();
            meta.insert("URL".into(), link.url.clone().into());
            meta.insert(
                "Authenticated-User".into(),
                if link.authenticated { "Y" } else { "N" }.into(),
            );
            meta.insert("Context".into(), link.context.as_str().into());
            root.insert(link.name.clone().into(), Value::Mapping(meta));
        }
        Ok(serde_yaml::to_string(&Value::Mapping(root))?)
    }

    /// Adds a weblink, replacing any entry with the same name
    pub fn upsert(&mut self, link: Weblink) {
        match self.links.iter_mut().find(|l| l.name == link.name) {
            Some(existing) => *existing = link,
            None => self.links.push(link),
        }
    }

    pub fn find(&self, name: &str) -> Option<&Weblink> {
        self.links.iter().find(|l| l.name == name)
    }

    pub fn first(&self) -> Option<&Weblink> {
        self.links.first()
    }

    pub fn links(&self) -> &[Weblink] {
        &self.links
    }
}

/// Case-insensitive key lookup in a YAML mapping
fn lookup<'a>(meta: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let Value::Mapping(map) = meta else {
        return None;
    };
    keys.iter().find_map(|wanted| {
        map.iter().find_map(|(key, value)| match key {
            Value::String(k) if k.eq_ignore_ascii_case(wanted) => Some(value),
            _ => None,
        })
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Interpret Y/N style flags, falling back when the value is absent or unrecognised
pub fn resolve_boolean_flag(value: Option<&Value>, fallback: bool) -> bool {
    match value {
        None | Some(Value::Null) => fallback,
        Some(Value::Bool(b)) => *b,
        Some(other) => match scalar_to_string(other).map(|s| s.to_lowercase()).as_deref() {
            Some("true" | "y" | "yes" | "1") => true,
            Some("false" | "n" | "no" | "0") => false,
            _ => fallback,
        },
    }
}
