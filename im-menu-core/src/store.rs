//! Menu tree model
//!
//! A [`MenuTreeStore`] owns one forest of menus (business or login). Menus
//! are linked through submenu-bearing items; the store keeps those links
//! acyclic, keeps every link target inside the forest and lets each menu be
//! claimed by at most one parent.

use std::collections::{HashMap, HashSet};

use crate::error::MenuError;
use crate::models::{
    slugify, FunctionCall, ItemType, Menu, MenuItem, MenuItemKind, MenuType, ROOT_MENU_NAME,
};

/// Values an item falls back to when its type changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetypeDefaults {
    /// Function used by function types; callers resolve it against the registry
    pub function_id: String,
    /// Weblink name used by the weblink type
    pub weblink: String,
}

/// One menu forest and its editing state
#[derive(Debug, Clone)]
pub struct MenuTreeStore {
    menu_type: MenuType,
    root_id: String,
    menus_by_id: HashMap<String, Menu>,
    menu_order: Vec<String>,
    selected_menu_id: String,
    menu_id_counter: u32,
    item_id_counter: u32,
}

impl MenuTreeStore {
    /// Creates a store holding only the root menu
    pub fn new(menu_type: MenuType) -> Self {
        let mut store = Self::empty(menu_type);
        store.ensure_root();
        store
    }

    /// A store without any menu, not even the root
    pub(crate) fn empty(menu_type: MenuType) -> Self {
        let root_id = menu_type.root_id().to_string();
        Self {
            menu_type,
            selected_menu_id: root_id.clone(),
            root_id,
            menus_by_id: HashMap::new(),
            menu_order: Vec::new(),
            menu_id_counter: 0,
            item_id_counter: 0,
        }
    }

    /// Inserts the root menu in front of the order if it is missing
    pub(crate) fn ensure_root(&mut self) {
        if !self.menus_by_id.contains_key(&self.root_id) {
            self.menus_by_id
                .insert(self.root_id.clone(), Menu::new(self.root_id.clone(), ROOT_MENU_NAME));
            self.menu_order.insert(0, self.root_id.clone());
        }
    }

    /// Inserts an empty menu with a known-unique id at the end of the order
    pub(crate) fn insert_shell(&mut self, id: String, name: String) {
        debug_assert!(!self.menus_by_id.contains_key(&id));
        self.menu_order.push(id.clone());
        self.menus_by_id.insert(id.clone(), Menu::new(id, name));
    }

    pub(crate) fn set_menu_counter(&mut self, value: u32) {
        self.menu_id_counter = value;
    }

    pub fn menu_type(&self) -> MenuType {
        self.menu_type
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn root(&self) -> &Menu {
        // The root is inserted on construction and never removed
        &self.menus_by_id[&self.root_id]
    }

    pub fn menu(&self, id: &str) -> Option<&Menu> {
        self.menus_by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.menus_by_id.contains_key(id)
    }

    /// Menu ids in display order
    pub fn menu_order(&self) -> &[String] {
        &self.menu_order
    }

    /// Menus in display order
    pub fn menus(&self) -> impl Iterator<Item = &Menu> + '_ {
        self.menu_order.iter().filter_map(|id| self.menus_by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.menus_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.menus_by_id.is_empty()
    }

    pub fn selected_menu_id(&self) -> &str {
        &self.selected_menu_id
    }

    pub fn select_menu(&mut self, id: &str) -> Result<(), MenuError> {
        if !self.contains(id) {
            return Err(MenuError::UnknownMenu(id.to_string()));
        }
        self.selected_menu_id = id.to_string();
        Ok(())
    }

    /// Gets an item by its position in a menu
    pub fn item(&self, menu_id: &str, index: usize) -> Result<&MenuItem, MenuError> {
        let menu = self.menu_required(menu_id)?;
        menu.items.get(index).ok_or_else(|| MenuError::UnknownItem {
            menu_id: menu_id.to_string(),
            index,
        })
    }

    fn menu_required(&self, id: &str) -> Result<&Menu, MenuError> {
        self.menus_by_id
            .get(id)
            .ok_or_else(|| MenuError::UnknownMenu(id.to_string()))
    }

    fn menu_required_mut(&mut self, id: &str) -> Result<&mut Menu, MenuError> {
        self.menus_by_id
            .get_mut(id)
            .ok_or_else(|| MenuError::UnknownMenu(id.to_string()))
    }

    fn item_mut(&mut self, menu_id: &str, index: usize) -> Result<&mut MenuItem, MenuError> {
        let menu = self.menu_required_mut(menu_id)?;
        menu.items.get_mut(index).ok_or_else(|| MenuError::UnknownItem {
            menu_id: menu_id.to_string(),
            index,
        })
    }

    /// Derives a free menu id from a display name
    pub(crate) fn next_menu_id(&mut self, name: &str) -> String {
        let mut base = slugify(name);
        if base.is_empty() {
            self.menu_id_counter += 1;
            base = format!("menu-{}", self.menu_id_counter);
        }
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.menus_by_id.contains_key(&candidate) {
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        candidate
    }

    fn next_item_id(&mut self) -> String {
        self.item_id_counter += 1;
        format!("item-{}", self.item_id_counter)
    }

    // =========================================================================
    // Menu operations
    // =========================================================================

    /// Creates an empty menu and returns its id. The new menu is not selected.
    pub fn create_menu(&mut self, name: &str) -> Result<String, MenuError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MenuError::EmptyName);
        }
        let id = self.next_menu_id(name);
        self.insert_shell(id.clone(), name.to_string());
        tracing::debug!(menu_type = %self.menu_type, %id, "created menu");
        Ok(id)
    }

    /// Renames a menu. Callers decide whether the root may be renamed.
    pub fn rename_menu(&mut self, id: &str, name: &str) -> Result<(), MenuError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MenuError::EmptyName);
        }
        let menu = self.menu_required_mut(id)?;
        menu.name = name.to_string();
        Ok(())
    }

    /// Deletes a menu together with every menu reachable from it through
    /// submenu links, then unlinks the remaining references to them.
    ///
    /// Returns the removed ids; deleting the root or an unknown id removes nothing.
    pub fn delete_menu(&mut self, id: &str) -> Vec<String> {
        if id == self.root_id || !self.contains(id) {
            return Vec::new();
        }

        let removed = self.descendants(id);
        let removed_set: HashSet<&str> = removed.iter().map(String::as_str).collect();
        for menu_id in &removed {
            self.menus_by_id.remove(menu_id);
        }
        self.menu_order.retain(|m| !removed_set.contains(m.as_str()));

        for menu in self.menus_by_id.values_mut() {
            if menu
                .parent_id
                .as_deref()
                .is_some_and(|p| removed_set.contains(p))
            {
                menu.parent_id = None;
            }
            let items = std::mem::take(&mut menu.items);
            menu.items = items
                .into_iter()
                .filter_map(|item| unlink_removed(item, &removed_set))
                .collect();
        }

        if !self.contains(&self.selected_menu_id) {
            self.selected_menu_id = self.root_id.clone();
        }
        tracing::debug!(menu_type = %self.menu_type, ?removed, "deleted menus");
        removed
    }

    /// Ids of `id` and every menu reachable from it through submenu links,
    /// in depth-first order. Missing and already visited ids end the walk.
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut ids = Vec::new();
        let mut visited = HashSet::new();
        self.visit_descendants(id, &mut ids, &mut visited);
        ids
    }

    fn visit_descendants(&self, id: &str, ids: &mut Vec<String>, visited: &mut HashSet<String>) {
        if !visited.insert(id.to_string()) {
            return;
        }
        let Some(menu) = self.menus_by_id.get(id) else {
            return;
        };
        ids.push(id.to_string());
        for item in &menu.items {
            if let Some(target) = item.kind.submenu_id() {
                if target != self.root_id {
                    self.visit_descendants(target, ids, visited);
                }
            }
        }
    }

    // =========================================================================
    // Item operations
    // =========================================================================

    /// Appends an item to a menu and returns the new item id.
    ///
    /// Submenu-bearing kinds claim their target first; if the claim is
    /// rejected nothing is added.
    pub fn add_item(
        &mut self,
        menu_id: &str,
        label: &str,
        kind: MenuItemKind,
    ) -> Result<String, MenuError> {
        self.menu_required(menu_id)?;
        let label = label.trim();
        if label.is_empty() {
            return Err(MenuError::EmptyLabel);
        }
        if let Some(target) = kind.submenu_id() {
            self.link_submenu(menu_id, target)?;
        }

        let id = self.next_item_id();
        let item = MenuItem {
            id: id.clone(),
            label: label.to_string(),
            kind,
        };
        self.menu_required_mut(menu_id)?.items.push(item);
        tracing::debug!(%menu_id, item_id = %id, "added menu item");
        Ok(id)
    }

    /// Moves an item to a new position; out-of-range positions are ignored
    pub fn move_item(&mut self, menu_id: &str, from: usize, to: usize) -> Result<(), MenuError> {
        let menu = self.menu_required_mut(menu_id)?;
        let len = menu.items.len();
        if from >= len || to >= len {
            return Ok(());
        }
        let moved = menu.items.remove(from);
        menu.items.insert(to, moved);
        Ok(())
    }

    /// Removes an item, releasing its submenu claim but keeping the submenu
    pub fn delete_item(&mut self, menu_id: &str, index: usize) -> Result<MenuItem, MenuError> {
        self.item(menu_id, index)?;
        let removed = self.menu_required_mut(menu_id)?.items.remove(index);
        if let Some(target) = removed.kind.submenu_id() {
            self.release_link(menu_id, target);
        }
        Ok(removed)
    }

    /// Changes what an item does, keeping its label.
    ///
    /// Switching to a submenu-bearing type picks an eligible target (the
    /// currently held one when possible) and fails with
    /// [`MenuError::NoSubmenuAvailable`] if there is none. Switching away
    /// releases the held claim.
    pub fn change_item_type(
        &mut self,
        menu_id: &str,
        index: usize,
        new_type: ItemType,
        defaults: &RetypeDefaults,
    ) -> Result<(), MenuError> {
        let item = self.item(menu_id, index)?;
        let held = item.kind.submenu_id().map(str::to_string);
        let call = match item.kind.call() {
            Some(existing) => FunctionCall {
                function_id: defaults.function_id.clone(),
                ..existing.clone()
            },
            None => FunctionCall::new(defaults.function_id.clone()),
        };

        let kind = match new_type {
            ItemType::Submenu | ItemType::FunctionMenu => {
                let target = self
                    .pick_submenu(menu_id, held.as_deref())
                    .ok_or(MenuError::NoSubmenuAvailable)?;
                self.link_submenu(menu_id, &target)?;
                if new_type == ItemType::Submenu {
                    MenuItemKind::Submenu { submenu_id: target }
                } else {
                    MenuItemKind::FunctionMenu {
                        call,
                        submenu_id: target,
                    }
                }
            }
            ItemType::Function => MenuItemKind::Function { call },
            ItemType::Weblink => MenuItemKind::Weblink {
                weblink: defaults.weblink.clone(),
            },
        };

        self.item_mut(menu_id, index)?.kind = kind;
        if let Some(previous) = held {
            self.release_link(menu_id, &previous);
        }
        Ok(())
    }

    fn pick_submenu(&self, menu_id: &str, held: Option<&str>) -> Option<String> {
        let candidates = self.available_submenus(menu_id, held);
        candidates
            .iter()
            .find(|m| Some(m.id.as_str()) == held)
            .or_else(|| candidates.first())
            .map(|m| m.id.clone())
    }

    /// Points a submenu-bearing item at a different menu
    pub fn retarget_item(
        &mut self,
        menu_id: &str,
        index: usize,
        submenu_id: &str,
    ) -> Result<(), MenuError> {
        let item = self.item(menu_id, index)?;
        let Some(previous) = item.kind.submenu_id().map(str::to_string) else {
            return Err(MenuError::ItemTypeMismatch {
                item_id: item.id.clone(),
                actual: item.kind.item_type(),
            });
        };
        if previous == submenu_id {
            return Ok(());
        }
        self.link_submenu(menu_id, submenu_id)?;

        match &mut self.item_mut(menu_id, index)?.kind {
            MenuItemKind::FunctionMenu { submenu_id: target, .. }
            | MenuItemKind::Submenu { submenu_id: target } => *target = submenu_id.to_string(),
            _ => {}
        }
        self.release_link(menu_id, &previous);
        Ok(())
    }

    pub fn relabel_item(&mut self, menu_id: &str, index: usize, label: &str) -> Result<(), MenuError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(MenuError::EmptyLabel);
        }
        self.item_mut(menu_id, index)?.label = label.to_string();
        Ok(())
    }

    /// Replaces the function call of a function or function-menu item
    pub fn set_item_call(
        &mut self,
        menu_id: &str,
        index: usize,
        new_call: FunctionCall,
    ) -> Result<(), MenuError> {
        let item = self.item_mut(menu_id, index)?;
        match &mut item.kind {
            MenuItemKind::Function { call } | MenuItemKind::FunctionMenu { call, .. } => {
                *call = new_call;
                Ok(())
            }
            other => Err(MenuError::ItemTypeMismatch {
                item_id: item.id.clone(),
                actual: other.item_type(),
            }),
        }
    }

    /// Replaces the weblink of a weblink item
    pub fn set_item_weblink(
        &mut self,
        menu_id: &str,
        index: usize,
        name: &str,
    ) -> Result<(), MenuError> {
        let item = self.item_mut(menu_id, index)?;
        match &mut item.kind {
            MenuItemKind::Weblink { weblink } => {
                *weblink = name.to_string();
                Ok(())
            }
            other => Err(MenuError::ItemTypeMismatch {
                item_id: item.id.clone(),
                actual: other.item_type(),
            }),
        }
    }

    // =========================================================================
    // Links
    // =========================================================================

    /// Makes `parent_id` the parent of `submenu_id`.
    ///
    /// Checks, in order: the target exists, is not the root, is not the
    /// parent itself, is not an ancestor of the parent, and is not claimed by
    /// a different parent.
    pub fn link_submenu(&mut self, parent_id: &str, submenu_id: &str) -> Result<(), MenuError> {
        self.menu_required(parent_id)?;
        let target = self
            .menus_by_id
            .get(submenu_id)
            .ok_or_else(|| MenuError::UnknownTarget(submenu_id.to_string()))?;
        if submenu_id == self.root_id {
            return Err(MenuError::RootCannotBeNested);
        }
        if submenu_id == parent_id {
            return Err(MenuError::SelfLink);
        }
        if self.is_ancestor(submenu_id, parent_id) {
            return Err(MenuError::CyclicLink(target.name.clone()));
        }
        if target.parent_id.as_deref().is_some_and(|p| p != parent_id) {
            return Err(MenuError::AlreadyClaimed(target.name.clone()));
        }

        if let Some(target) = self.menus_by_id.get_mut(submenu_id) {
            target.parent_id = Some(parent_id.to_string());
        }
        Ok(())
    }

    /// Drops `parent_id`'s claim on `submenu_id` unless one of its items still links there
    fn release_link(&mut self, parent_id: &str, submenu_id: &str) {
        let still_claimed = self
            .menus_by_id
            .get(parent_id)
            .is_some_and(|menu| menu.references(submenu_id));
        if still_claimed {
            return;
        }
        if let Some(submenu) = self.menus_by_id.get_mut(submenu_id) {
            if submenu.parent_id.as_deref() == Some(parent_id) {
                submenu.parent_id = None;
            }
        }
    }

    /// Menus `parent_id` may link to, in display order.
    ///
    /// `current` is the target an edited item already holds; it stays
    /// eligible even though it is claimed.
    pub fn available_submenus(&self, parent_id: &str, current: Option<&str>) -> Vec<&Menu> {
        self.menus()
            .filter(|menu| menu.id != self.root_id && menu.id != parent_id)
            .filter(|menu| {
                if self.is_ancestor(&menu.id, parent_id) {
                    return false;
                }
                match menu.parent_id.as_deref() {
                    Some(p) if p != parent_id => current == Some(menu.id.as_str()),
                    _ => true,
                }
            })
            .collect()
    }

    /// Whether `target_id` appears on the parent chain above `child_id`
    pub fn is_ancestor(&self, target_id: &str, child_id: &str) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.menus_by_id.get(child_id);
        while let Some(menu) = current {
            let Some(parent) = menu.parent_id.as_deref() else {
                break;
            };
            if parent == target_id {
                return true;
            }
            if !visited.insert(parent) {
                break;
            }
            current = self.menus_by_id.get(parent);
        }
        false
    }
}

/// Drops submenu items pointing at removed menus and turns function-menu
/// items into plain function items
fn unlink_removed(item: MenuItem, removed: &HashSet<&str>) -> Option<MenuItem> {
    let MenuItem { id, label, kind } = item;
    let kind = match kind {
        MenuItemKind::Submenu { submenu_id } if removed.contains(submenu_id.as_str()) => {
            return None;
        }
        MenuItemKind::FunctionMenu { call, submenu_id } if removed.contains(submenu_id.as_str()) => {
            MenuItemKind::Function { call }
        }
        other => other,
    };
    Some(MenuItem { id, label, kind })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submenu(id: &str) -> MenuItemKind {
        MenuItemKind::Submenu {
            submenu_id: id.to_string(),
        }
    }

    fn function(id: &str) -> MenuItemKind {
        MenuItemKind::Function {
            call: FunctionCall::new(id),
        }
    }

    fn defaults() -> RetypeDefaults {
        RetypeDefaults {
            function_id: "HELLO_WORLD".into(),
            weblink: "portal".into(),
        }
    }

    #[test]
    fn test_new_store_has_root() {
        let store = MenuTreeStore::new(MenuType::Business);
        assert_eq!(store.root_id(), "home");
        assert_eq!(store.root().name, "Home");
        assert_eq!(store.root().parent_id, None);
        assert_eq!(store.menu_order(), ["home".to_string()]);
        assert_eq!(store.selected_menu_id(), "home");
    }

    #[test]
    fn test_create_menu_dedupes_slugs() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        assert_eq!(store.create_menu("Billing").unwrap(), "billing");
        assert_eq!(store.create_menu("Billing").unwrap(), "billing-1");
        assert_eq!(store.create_menu(" billing ").unwrap(), "billing-2");
        assert_eq!(store.menu_order().len(), 4);
        assert_eq!(store.selected_menu_id(), "home");
    }

    #[test]
    fn test_create_menu_rejects_empty_name() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        assert_eq!(store.create_menu("   "), Err(MenuError::EmptyName));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_menu_without_slug_uses_counter() {
        let mut store = MenuTreeStore::new(MenuType::Login);
        assert_eq!(store.create_menu("???").unwrap(), "menu-1");
        assert_eq!(store.create_menu("!!!").unwrap(), "menu-2");
    }

    #[test]
    fn test_rename_menu() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let id = store.create_menu("Billing").unwrap();
        store.rename_menu(&id, "  Payments ").unwrap();
        assert_eq!(store.menu(&id).unwrap().name, "Payments");

        assert_eq!(store.rename_menu(&id, " "), Err(MenuError::EmptyName));
        assert_eq!(store.menu(&id).unwrap().name, "Payments");
        assert_eq!(
            store.rename_menu("nope", "X"),
            Err(MenuError::UnknownMenu("nope".into()))
        );
    }

    #[test]
    fn test_self_link_rejected() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let id = store.create_menu("Billing").unwrap();
        assert_eq!(store.link_submenu(&id, &id), Err(MenuError::SelfLink));
        assert!(!store.is_ancestor(&id, &id));
    }

    #[test]
    fn test_root_cannot_be_nested() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let billing = store.create_menu("Billing").unwrap();
        assert!(store.link_submenu("home", &billing).is_ok());
        assert_eq!(
            store.link_submenu(&billing, "home"),
            Err(MenuError::RootCannotBeNested)
        );
    }

    #[test]
    fn test_unknown_target_rejected() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        assert_eq!(
            store.link_submenu("home", "ghost"),
            Err(MenuError::UnknownTarget("ghost".into()))
        );
        assert_eq!(
            store.link_submenu("ghost", "home"),
            Err(MenuError::UnknownMenu("ghost".into()))
        );
    }

    #[test]
    fn test_cyclic_link_rejected() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let a = store.create_menu("A").unwrap();
        let b = store.create_menu("B").unwrap();
        store.add_item(&a, "Go to B", submenu(&b)).unwrap();

        assert_eq!(store.link_submenu(&b, &a), Err(MenuError::CyclicLink("A".into())));
        assert_eq!(store.menu(&a).unwrap().parent_id, None);
    }

    #[test]
    fn test_already_claimed_rejected() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let a = store.create_menu("A").unwrap();
        let b = store.create_menu("B").unwrap();
        let c = store.create_menu("C").unwrap();
        store.add_item(&a, "C", submenu(&c)).unwrap();

        let result = store.add_item(&b, "C too", submenu(&c));
        assert_eq!(result, Err(MenuError::AlreadyClaimed("C".into())));
        assert!(store.menu(&b).unwrap().items.is_empty());
        assert_eq!(store.menu(&c).unwrap().parent_id.as_deref(), Some(a.as_str()));

        // The same parent may link a menu twice
        assert!(store.add_item(&a, "C again", submenu(&c)).is_ok());
    }

    #[test]
    fn test_add_item_to_unknown_menu() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        assert_eq!(
            store.add_item("ghost", "X", function("HELLO_WORLD")),
            Err(MenuError::UnknownMenu("ghost".into()))
        );
        assert_eq!(store.add_item("home", "  ", function("HELLO_WORLD")), Err(MenuError::EmptyLabel));
    }

    #[test]
    fn test_item_ids_are_monotonic() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let first = store.add_item("home", "One", function("HELLO_WORLD")).unwrap();
        store.delete_item("home", 0).unwrap();
        let second = store.add_item("home", "Two", function("HELLO_WORLD")).unwrap();
        assert_eq!(first, "item-1");
        assert_eq!(second, "item-2");
    }

    #[test]
    fn test_move_item() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        for label in ["One", "Two", "Three"] {
            store.add_item("home", label, function("HELLO_WORLD")).unwrap();
        }
        store.move_item("home", 0, 2).unwrap();
        let labels: Vec<&str> = store.root().items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["Two", "Three", "One"]);

        store.move_item("home", 1, 3).unwrap();
        store.move_item("home", 5, 0).unwrap();
        let labels: Vec<&str> = store.root().items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["Two", "Three", "One"]);
    }

    #[test]
    fn test_delete_item_releases_claim() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let billing = store.create_menu("Billing").unwrap();
        store.add_item("home", "Billing", submenu(&billing)).unwrap();
        store.add_item("home", "Billing again", submenu(&billing)).unwrap();

        store.delete_item("home", 0).unwrap();
        assert_eq!(store.menu(&billing).unwrap().parent_id.as_deref(), Some("home"));

        let removed = store.delete_item("home", 0).unwrap();
        assert_eq!(removed.label, "Billing again");
        assert_eq!(store.menu(&billing).unwrap().parent_id, None);
        assert!(store.contains(&billing));

        assert_eq!(
            store.delete_item("home", 0),
            Err(MenuError::UnknownItem {
                menu_id: "home".into(),
                index: 0
            })
        );
    }

    #[test]
    fn test_delete_root_is_noop() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        store.create_menu("Billing").unwrap();
        let order = store.menu_order().to_vec();
        assert!(store.delete_menu("home").is_empty());
        assert_eq!(store.menu_order(), order.as_slice());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_delete_menu_cascades() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let parent = store.create_menu("Parent").unwrap();
        let child = store.create_menu("Child").unwrap();
        let grandchild = store.create_menu("Grandchild").unwrap();
        store.add_item("home", "Parent", submenu(&parent)).unwrap();
        store
            .add_item(
                &parent,
                "Child",
                MenuItemKind::FunctionMenu {
                    call: FunctionCall::new("MY_ISSUES"),
                    submenu_id: child.clone(),
                },
            )
            .unwrap();
        store.add_item(&child, "Grandchild", submenu(&grandchild)).unwrap();
        store.select_menu(&child).unwrap();

        let removed = store.delete_menu(&parent);
        assert_eq!(removed, vec![parent.clone(), child, grandchild]);
        assert_eq!(store.menu_order(), ["home".to_string()]);
        assert!(store.root().items.is_empty());
        assert_eq!(store.selected_menu_id(), "home");
    }

    #[test]
    fn test_delete_menu_unlinks_other_referents() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let parent = store.create_menu("Parent").unwrap();
        let other = store.create_menu("Other").unwrap();
        let shared = store.create_menu("Shared").unwrap();
        store.add_item(&parent, "Shared", submenu(&shared)).unwrap();
        // A second referent can only come from a loaded document; force it here
        store.menus_by_id.get_mut(&other).unwrap().items.push(MenuItem {
            id: "item-99".into(),
            label: "Shared via other".into(),
            kind: MenuItemKind::FunctionMenu {
                call: FunctionCall::new("MY_ISSUES"),
                submenu_id: shared.clone(),
            },
        });

        store.delete_menu(&parent);
        assert!(!store.contains(&shared));
        let other_menu = store.menu(&other).unwrap();
        assert_eq!(other_menu.items.len(), 1);
        assert_eq!(other_menu.items[0].kind.item_type(), ItemType::Function);
        assert!(store.menus().all(|m| !m.references(&shared)));
    }

    #[test]
    fn test_descendants_survive_stray_cycle() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let a = store.create_menu("A").unwrap();
        let b = store.create_menu("B").unwrap();
        store.add_item(&a, "B", submenu(&b)).unwrap();
        store.menus_by_id.get_mut(&b).unwrap().items.push(MenuItem {
            id: "item-99".into(),
            label: "A".into(),
            kind: submenu(&a),
        });
        assert_eq!(store.descendants(&a), vec![a.clone(), b.clone()]);
    }

    #[test]
    fn test_available_submenus() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let a = store.create_menu("A").unwrap();
        let b = store.create_menu("B").unwrap();
        let c = store.create_menu("C").unwrap();
        store.add_item("home", "A", submenu(&a)).unwrap();
        store.add_item(&a, "B", submenu(&b)).unwrap();

        let ids = |menus: Vec<&Menu>| menus.iter().map(|m| m.id.clone()).collect::<Vec<_>>();

        // From B: A is an ancestor, B is itself, root never
        assert_eq!(ids(store.available_submenus(&b, None)), vec![c.clone()]);
        // From home: B is claimed by A
        assert_eq!(ids(store.available_submenus("home", None)), vec![a.clone(), c.clone()]);
        // Editing an item that already holds B keeps it eligible
        assert_eq!(
            ids(store.available_submenus("home", Some(&b))),
            vec![a.clone(), b.clone(), c.clone()]
        );
    }

    #[test]
    fn test_change_item_type_to_submenu_requires_target() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        store.add_item("home", "Hello", function("HELLO_WORLD")).unwrap();

        let result = store.change_item_type("home", 0, ItemType::Submenu, &defaults());
        assert_eq!(result, Err(MenuError::NoSubmenuAvailable));
        assert_eq!(store.root().items[0].kind, function("HELLO_WORLD"));
    }

    #[test]
    fn test_change_item_type_round_trip() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let billing = store.create_menu("Billing").unwrap();
        store.add_item("home", "Hello", function("MY_ISSUES")).unwrap();

        let retype = RetypeDefaults {
            function_id: "MY_ISSUES".into(),
            weblink: "portal".into(),
        };
        store
            .change_item_type("home", 0, ItemType::FunctionMenu, &retype)
            .unwrap();
        assert_eq!(
            store.root().items[0].kind,
            MenuItemKind::FunctionMenu {
                call: FunctionCall::new("MY_ISSUES"),
                submenu_id: billing.clone()
            }
        );
        assert_eq!(store.menu(&billing).unwrap().parent_id.as_deref(), Some("home"));

        store.change_item_type("home", 0, ItemType::Submenu, &retype).unwrap();
        assert_eq!(store.root().items[0].kind, submenu(&billing));
        assert_eq!(store.menu(&billing).unwrap().parent_id.as_deref(), Some("home"));

        store.change_item_type("home", 0, ItemType::Weblink, &retype).unwrap();
        assert_eq!(
            store.root().items[0].kind,
            MenuItemKind::Weblink {
                weblink: "portal".into()
            }
        );
        assert_eq!(store.menu(&billing).unwrap().parent_id, None);
    }

    #[test]
    fn test_retarget_item() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        let a = store.create_menu("A").unwrap();
        let b = store.create_menu("B").unwrap();
        store.add_item("home", "Go", submenu(&a)).unwrap();

        store.retarget_item("home", 0, &b).unwrap();
        assert_eq!(store.root().items[0].kind, submenu(&b));
        assert_eq!(store.menu(&a).unwrap().parent_id, None);
        assert_eq!(store.menu(&b).unwrap().parent_id.as_deref(), Some("home"));

        assert_eq!(store.retarget_item("home", 0, "home"), Err(MenuError::RootCannotBeNested));
        assert_eq!(store.root().items[0].kind, submenu(&b));

        store.add_item("home", "Hello", function("HELLO_WORLD")).unwrap();
        assert!(matches!(
            store.retarget_item("home", 1, &a),
            Err(MenuError::ItemTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_relabel_and_set_call() {
        let mut store = MenuTreeStore::new(MenuType::Business);
        store.add_item("home", "Hello", function("HELLO_WORLD")).unwrap();
        store.relabel_item("home", 0, "Hi there").unwrap();
        assert_eq!(store.root().items[0].label, "Hi there");
        assert_eq!(store.relabel_item("home", 0, ""), Err(MenuError::EmptyLabel));

        let mut call = FunctionCall::new("MY_ISSUES");
        call.use_translation = false;
        store.set_item_call("home", 0, call.clone()).unwrap();
        assert_eq!(store.root().items[0].kind, MenuItemKind::Function { call });
        assert!(store.set_item_weblink("home", 0, "portal").is_err());
    }
}
