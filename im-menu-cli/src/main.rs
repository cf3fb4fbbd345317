mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::Path;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use im_menu_core::{
    export_session, function_rule_note, open_session, save_session, ContextFlag, EditingSession,
    FunctionCall, ItemType, LoadedSession, Menu, MenuItemKind, MenuTreeStore, MenuType,
    RequestContext, Settings,
};

use crate::cli::{Cli, Command, ContextArgs, ItemCommand, MenuCommand};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let menu_type = MenuType::parse(&cli.menu_type).with_context(|| {
        format!("Unknown menu type '{}' (expected business or login)", cli.menu_type)
    })?;
    let settings = Settings::load_default()?.with_config_dir_override(
        cli.config_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned()),
    );

    let loaded = open_session(&settings)?;
    if cli.command.saves() {
        loaded.ensure_override_writable(&settings)?;
    }
    let LoadedSession {
        mut session,
        source,
        skipped,
    } = loaded;
    session.switch_menu_type(menu_type);
    tracing::debug!(?source, %menu_type, "opened editing session");

    match &cli.command {
        Command::Show { menu } => {
            if let Some(menu) = menu {
                session.active_mut().select_menu(menu)?;
            }
            show_tree(&session)?;
        }
        Command::Preview => println!("{}", session.to_json()?),
        Command::Menu(menu_cmd) => handle_menu_command(menu_cmd, &mut session, &settings)?,
        Command::Item(item_cmd) => handle_item_command(item_cmd, &mut session, &settings)?,
        Command::Functions => list_functions(&session),
        Command::Weblinks { yaml } => {
            if *yaml {
                print!("{}", session.weblinks().to_yaml()?);
            } else {
                list_weblinks(&session);
            }
        }
        Command::Import { file } => import_document(&mut session, &settings, file)?,
        Command::Export { file } => {
            export_session(&session, file)?;
            println!("{} Exported menus to {}", "✓".green(), file.display());
        }
        Command::Reset { yes } => {
            if !*yes && !prompts::confirm_reset()? {
                println!("{}", "Reset cancelled.".yellow());
                return Ok(());
            }
            session.reset_to_default();
            let path = save_session(&settings, &session)?;
            println!("{} Restored default menus in {}", "✓".green(), path.display());
        }
    }

    if matches!(cli.command, Command::Show { .. }) {
        match source {
            Some(path) => println!("{}", format!("Loaded from {}", path.display()).dimmed()),
            None => println!("{}", "Using the built-in default menus".dimmed()),
        }
        for document in &skipped {
            println!(
                "{} {} could not be read: {}",
                "!".yellow(),
                document.path.display(),
                document.error
            );
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Converts a 1-based position from the command line
fn to_index(position: usize) -> Result<usize> {
    if position == 0 {
        anyhow::bail!("Item positions start at 1");
    }
    Ok(position - 1)
}

fn parse_item_type(s: &str) -> Result<ItemType> {
    ItemType::parse(s).with_context(|| {
        format!(
            "Unknown item type '{}' (expected function, function-menu, submenu or weblink)",
            s
        )
    })
}

// =============================================================================
// Display
// =============================================================================

fn describe_item(session: &EditingSession, kind: &MenuItemKind) -> String {
    let store = session.active();
    let menu_name = |id: &str| {
        store
            .menu(id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    match kind {
        MenuItemKind::Function { call } => format!("function {}", call.function_id.cyan()),
        MenuItemKind::FunctionMenu { call, submenu_id } => format!(
            "function {} then menu {}",
            call.function_id.cyan(),
            menu_name(submenu_id.as_str()).blue()
        ),
        MenuItemKind::Submenu { submenu_id } => {
            format!("menu {}", menu_name(submenu_id.as_str()).blue())
        }
        MenuItemKind::Weblink { weblink } => {
            let url = session
                .weblinks()
                .find(weblink)
                .map(|l| l.url.clone())
                .unwrap_or_default();
            format!("weblink {} {}", weblink.magenta(), url.dimmed())
        }
    }
}

/// Prints the tree below the selected menu
fn show_tree(session: &EditingSession) -> Result<()> {
    let store = session.active();
    let start = store.selected_menu_id();
    let menu = store
        .menu(start)
        .with_context(|| format!("Menu '{}' not found", start))?;

    println!(
        "{} {}",
        format!("{} menus", store.menu_type()).blue().bold(),
        format!("({} total)", store.len()).dimmed()
    );
    print_menu(session, store, menu, 0, &mut Vec::new());

    let detached: Vec<&Menu> = store
        .menus()
        .filter(|m| m.id != store.root_id() && m.parent_id.is_none())
        .collect();
    if start == store.root_id() && !detached.is_empty() {
        println!();
        println!("{}", "Not linked from any menu:".yellow());
        for menu in detached {
            println!("  {} {}", menu.name, format!("[{}]", menu.id).dimmed());
        }
    }
    Ok(())
}

fn print_menu(
    session: &EditingSession,
    store: &MenuTreeStore,
    menu: &Menu,
    depth: usize,
    path: &mut Vec<String>,
) {
    let indent = "  ".repeat(depth);
    println!("{}{} {}", indent, menu.name.bold(), format!("[{}]", menu.id).dimmed());
    path.push(menu.id.clone());

    for (index, item) in menu.items.iter().enumerate() {
        println!(
            "{}  {}. {} - {}",
            indent,
            index + 1,
            item.label,
            describe_item(session, &item.kind)
        );
        if let Some(target) = item.kind.submenu_id() {
            if path.iter().any(|p| p == target) {
                continue;
            }
            if let Some(child) = store.menu(target) {
                print_menu(session, store, child, depth + 2, path);
            }
        }
    }
    path.pop();
}

fn list_functions(session: &EditingSession) {
    println!("{}", "Available functions:".blue().bold());
    println!("{:<24} | {:<28} | {:<24}", "Id", "Label", "Callback");
    println!("{}", "-".repeat(82));
    for option in session.functions().options() {
        println!(
            "{:<24} | {:<28} | {:<24}",
            option.id, option.label, option.callback_data
        );
        if let Some(note) = function_rule_note(&option.id) {
            println!("  {}", note.dimmed());
        }
    }
}

fn list_weblinks(session: &EditingSession) {
    println!("{}", "Configured web links:".blue().bold());
    let links = session.weblinks().links();
    if links.is_empty() {
        println!("{}", "(No web links configured)".dimmed());
        return;
    }
    for link in links {
        println!(
            "  {} {} {} {}",
            link.name.magenta(),
            link.url,
            if link.authenticated {
                "authenticated".green()
            } else {
                "public".normal()
            },
            format!("context={}", link.context).dimmed()
        );
    }
}

// =============================================================================
// Commands
// =============================================================================

fn handle_menu_command(
    cmd: &MenuCommand,
    session: &mut EditingSession,
    settings: &Settings,
) -> Result<()> {
    match cmd {
        MenuCommand::List => {
            let store = session.active();
            println!("{:<24} | {:<24} | {:<16} | {}", "Id", "Name", "Parent", "Items");
            println!("{}", "-".repeat(76));
            for menu in store.menus() {
                println!(
                    "{:<24} | {:<24} | {:<16} | {}",
                    menu.id,
                    menu.name,
                    menu.parent_id.as_deref().unwrap_or("-"),
                    menu.items.len()
                );
            }
            return Ok(());
        }
        MenuCommand::Create { name } => {
            let id = session.active_mut().create_menu(name)?;
            println!("{} Menu '{}' created with id '{}'.", "✓".green(), name, id);
        }
        MenuCommand::Rename { id, name } => {
            session.active_mut().rename_menu(id, name)?;
            println!("{} Menu '{}' renamed to '{}'.", "✓".green(), id, name);
        }
        MenuCommand::Delete { id, yes } => {
            let store = session.active();
            if !store.contains(id) {
                anyhow::bail!("Menu '{}' not found", id);
            }
            if id == store.root_id() {
                println!("{}", "The root menu cannot be deleted.".yellow());
                return Ok(());
            }
            if !*yes && !prompts::confirm_menu_delete(store, id)? {
                println!("{}", "Deletion cancelled.".yellow());
                return Ok(());
            }
            let removed = session.active_mut().delete_menu(id);
            println!("{} Deleted {}.", "✓".green(), removed.join(", "));
        }
    }

    let path = save_session(settings, session)?;
    println!("{}", format!("Saved {}", path.display()).dimmed());
    Ok(())
}

fn handle_item_command(
    cmd: &ItemCommand,
    session: &mut EditingSession,
    settings: &Settings,
) -> Result<()> {
    match cmd {
        ItemCommand::Add {
            menu,
            label,
            r#type,
            function,
            submenu,
            weblink,
            no_translation,
            context,
        } => {
            let call = CallOptions {
                use_translation: !*no_translation,
                context: apply_context(context, RequestContext::default())?,
            };
            let kind = build_item_kind(
                parse_item_type(r#type)?,
                function.as_deref(),
                submenu.as_deref(),
                weblink.as_deref(),
                call,
            )?;
            let label = match label {
                Some(label) => label.clone(),
                None => default_label(session, &kind),
            };
            let id = session.add_item(menu, &label, kind)?;
            println!("{} Added '{}' to '{}' ({}).", "✓".green(), label, menu, id);
        }
        ItemCommand::Function {
            menu,
            position,
            function,
            no_translation,
            context,
        } => {
            let index = to_index(*position)?;
            let current = session
                .active()
                .item(menu, index)?
                .kind
                .call()
                .map(|call| call.context.clone())
                .unwrap_or_default();
            let call = FunctionCall {
                use_translation: !*no_translation,
                context: apply_context(context, current)?,
                ..FunctionCall::new(function.as_str())
            };
            session.set_item_call(menu, index, call)?;
            println!("{} Item {} now calls {}.", "✓".green(), position, function);
        }
        ItemCommand::Weblink {
            menu,
            position,
            name,
        } => {
            session.set_item_weblink(menu, to_index(*position)?, name)?;
            println!("{} Item {} now opens web link '{}'.", "✓".green(), position, name);
        }
        ItemCommand::Move { menu, from, to } => {
            if !move_item_checked(session, menu, *from, *to)? {
                let len = session.active().menu(menu).map_or(0, |m| m.items.len());
                println!(
                    "{}",
                    format!("Nothing moved: '{}' has {} item(s).", menu, len).yellow()
                );
                return Ok(());
            }
            println!("{} Moved item {} to position {}.", "✓".green(), from, to);
        }
        ItemCommand::Delete { menu, position } => {
            let removed = session.active_mut().delete_item(menu, to_index(*position)?)?;
            println!("{} Deleted '{}'.", "✓".green(), removed.label);
        }
        ItemCommand::Retype {
            menu,
            position,
            r#type,
        } => {
            let new_type = parse_item_type(r#type)?;
            session.change_item_type(menu, to_index(*position)?, new_type)?;
            println!("{} Item {} is now a {} item.", "✓".green(), position, new_type);
        }
        ItemCommand::Retarget {
            menu,
            position,
            submenu,
        } => {
            session
                .active_mut()
                .retarget_item(menu, to_index(*position)?, submenu)?;
            println!("{} Item {} now opens '{}'.", "✓".green(), position, submenu);
        }
        ItemCommand::Label {
            menu,
            position,
            label,
        } => {
            session
                .active_mut()
                .relabel_item(menu, to_index(*position)?, label)?;
            println!("{} Item {} relabelled '{}'.", "✓".green(), position, label);
        }
        ItemCommand::Targets { menu, position } => {
            let store = session.active();
            let current = match position {
                Some(p) => store
                    .item(menu, to_index(*p)?)?
                    .kind
                    .submenu_id()
                    .map(str::to_string),
                None => None,
            };
            let targets = store.available_submenus(menu, current.as_deref());
            if targets.is_empty() {
                println!("{}", "(No menu can be linked here; create one first)".dimmed());
            }
            for target in targets {
                println!("  {} {}", target.name, format!("[{}]", target.id).dimmed());
            }
            return Ok(());
        }
    }

    let path = save_session(settings, session)?;
    println!("{}", format!("Saved {}", path.display()).dimmed());
    Ok(())
}

/// Moves an item when both 1-based positions exist; returns whether it moved
fn move_item_checked(
    session: &mut EditingSession,
    menu: &str,
    from: usize,
    to: usize,
) -> Result<bool> {
    let (from_index, target_index) = (to_index(from)?, to_index(to)?);
    let len = session
        .active()
        .menu(menu)
        .with_context(|| format!("Menu '{}' not found", menu))?
        .items
        .len();
    if from_index >= len || target_index >= len {
        return Ok(false);
    }
    session.active_mut().move_item(menu, from_index, target_index)?;
    Ok(true)
}

/// Function-call settings given on the command line
struct CallOptions {
    use_translation: bool,
    context: RequestContext,
}

/// Parses `KEY[:LABEL]` into an enabled context flag
fn parse_context_flag(value: &str) -> Result<ContextFlag> {
    let (key, label) = value.split_once(':').unwrap_or((value, ""));
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Context key must not be empty in '{}'", value);
    }
    Ok(ContextFlag {
        enabled: true,
        key: key.to_string(),
        label: label.trim().to_string(),
    })
}

/// Applies the context options on top of an existing request context
fn apply_context(args: &ContextArgs, current: RequestContext) -> Result<RequestContext> {
    let mut context = if args.no_context {
        RequestContext::default()
    } else {
        current
    };
    if let Some(value) = &args.account_context {
        context.account = parse_context_flag(value)?;
    }
    if let Some(value) = &args.service_context {
        context.service = parse_context_flag(value)?;
    }
    if let Some(value) = &args.menu_context {
        context.menu = parse_context_flag(value)?;
    }
    Ok(context)
}

fn build_item_kind(
    item_type: ItemType,
    function: Option<&str>,
    submenu: Option<&str>,
    weblink: Option<&str>,
    options: CallOptions,
) -> Result<MenuItemKind> {
    let call = |function: Option<&str>| -> Result<FunctionCall> {
        let id = function.context("--function is required for this item type")?;
        Ok(FunctionCall {
            use_translation: options.use_translation,
            context: options.context.clone(),
            ..FunctionCall::new(id)
        })
    };
    let submenu_id = |submenu: Option<&str>| -> Result<String> {
        submenu
            .map(str::to_string)
            .context("--submenu is required for this item type")
    };

    Ok(match item_type {
        ItemType::Function => MenuItemKind::Function {
            call: call(function)?,
        },
        ItemType::FunctionMenu => MenuItemKind::FunctionMenu {
            call: call(function)?,
            submenu_id: submenu_id(submenu)?,
        },
        ItemType::Submenu => MenuItemKind::Submenu {
            submenu_id: submenu_id(submenu)?,
        },
        ItemType::Weblink => MenuItemKind::Weblink {
            weblink: weblink
                .context("--weblink is required for this item type")?
                .to_string(),
        },
    })
}

/// Label used when none is given: the function, menu or link name
fn default_label(session: &EditingSession, kind: &MenuItemKind) -> String {
    match kind {
        MenuItemKind::Function { call } | MenuItemKind::FunctionMenu { call, .. } => session
            .functions()
            .get(&call.function_id)
            .map(|f| f.label.clone())
            .unwrap_or_else(|| call.function_id.clone()),
        MenuItemKind::Submenu { submenu_id } => session
            .active()
            .menu(submenu_id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| submenu_id.clone()),
        MenuItemKind::Weblink { weblink } => weblink.clone(),
    }
}

fn import_document(session: &mut EditingSession, settings: &Settings, file: &Path) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read import file: {:?}", file))?;
    session.import_json(&text)?;
    let path = save_session(settings, session)?;

    println!("{} Imported {}.", "✓".green(), file.display());
    for menu_type in [MenuType::Business, MenuType::Login] {
        println!(
            "  {}: {} menus",
            menu_type,
            session.store(menu_type).len()
        );
    }
    println!("{}", format!("Saved {}", path.display()).dimmed());
    Ok(())
}
