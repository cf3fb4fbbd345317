use anyhow::Result;
use inquire::Confirm;

use im_menu_core::MenuTreeStore;

/// Asks before deleting a menu and every menu below it
pub fn confirm_menu_delete(store: &MenuTreeStore, menu_id: &str) -> Result<bool> {
    let cascade: Vec<String> = store
        .descendants(menu_id)
        .into_iter()
        .filter(|id| id != menu_id)
        .collect();
    let message = if cascade.is_empty() {
        format!("Delete menu '{}'?", menu_id)
    } else {
        format!(
            "Delete menu '{}' and its {} sub-menu(s) ({})?",
            menu_id,
            cascade.len(),
            cascade.join(", ")
        )
    };

    Ok(Confirm::new(&message).with_default(false).prompt()?)
}

/// Asks before replacing both forests with the built-in structure
pub fn confirm_reset() -> Result<bool> {
    Ok(Confirm::new("Discard all menu changes and restore the default menus?")
        .with_default(false)
        .prompt()?)
}
