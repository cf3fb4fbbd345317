use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Edit the menu configuration of the IM bot")]
pub struct Cli {
    /// Directory holding the menu documents (overrides the settings file)
    #[clap(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Menu forest to edit (business, login)
    #[clap(long, short = 'm', global = true, default_value = "business")]
    pub menu_type: String,

    /// Log more detail to stderr (-v info, -vv debug)
    #[clap(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the menu tree
    Show {
        /// Menu to start from (defaults to the root menu)
        menu: Option<String>,
    },

    /// Print the document that would be saved
    Preview,

    /// Manage menus
    #[clap(subcommand)]
    Menu(MenuCommand),

    /// Manage the items of a menu
    #[clap(subcommand)]
    Item(ItemCommand),

    /// List the functions menu items can invoke
    Functions,

    /// List the configured web links
    Weblinks {
        /// Print them in the weblinks.yaml layout
        #[clap(long)]
        yaml: bool,
    },

    /// Replace both menu forests with a JSON document
    Import {
        /// Path to the document
        file: PathBuf,
    },

    /// Write the menu document to a file
    Export {
        /// Destination path
        file: PathBuf,
    },

    /// Restore the built-in menu structure
    Reset {
        /// Skip the confirmation prompt
        #[clap(long)]
        yes: bool,
    },
}

impl Command {
    /// Whether the command writes the override document
    pub fn saves(&self) -> bool {
        match self {
            Command::Menu(cmd) => !matches!(cmd, MenuCommand::List),
            Command::Item(cmd) => !matches!(cmd, ItemCommand::Targets { .. }),
            Command::Import { .. } | Command::Reset { .. } => true,
            _ => false,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum MenuCommand {
    /// List all menus
    List,

    /// Create a new, unlinked menu
    Create {
        /// Display name; the id is derived from it
        name: String,
    },

    /// Rename a menu
    Rename {
        /// Menu id
        id: String,

        /// New display name
        name: String,
    },

    /// Delete a menu together with every menu below it
    Delete {
        /// Menu id
        id: String,

        /// Skip the confirmation prompt
        #[clap(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    /// Append an item to a menu
    Add {
        /// Menu id
        menu: String,

        /// Label shown to the user (defaults to the target's name)
        #[clap(long)]
        label: Option<String>,

        /// Item type (function, function-menu, submenu, weblink)
        #[clap(long, default_value = "function")]
        r#type: String,

        /// Function to invoke
        #[clap(long)]
        function: Option<String>,

        /// Menu to open
        #[clap(long)]
        submenu: Option<String>,

        /// Web link to open
        #[clap(long)]
        weblink: Option<String>,

        /// Send the literal label instead of the function's translation key
        #[clap(long)]
        no_translation: bool,

        #[clap(flatten)]
        context: ContextArgs,
    },

    /// Change the function of a function or function-menu item
    Function {
        menu: String,
        position: usize,
        function: String,

        /// Send the literal label instead of the function's translation key
        #[clap(long)]
        no_translation: bool,

        #[clap(flatten)]
        context: ContextArgs,
    },

    /// Point a weblink item at another configured link
    Weblink {
        menu: String,
        position: usize,
        name: String,
    },

    /// Move an item to another position (positions start at 1)
    Move {
        menu: String,
        from: usize,
        to: usize,
    },

    /// Delete an item; a linked menu is kept but unlinked
    Delete { menu: String, position: usize },

    /// Change the type of an item
    Retype {
        menu: String,
        position: usize,

        /// New type (function, function-menu, submenu, weblink)
        r#type: String,
    },

    /// Point a submenu or function-menu item at another menu
    Retarget {
        menu: String,
        position: usize,
        submenu: String,
    },

    /// Change the label of an item
    Label {
        menu: String,
        position: usize,
        label: String,
    },

    /// List the menus an item of this menu may link to
    Targets {
        menu: String,

        /// Item whose current target stays eligible
        position: Option<usize>,
    },
}

/// Request context sent along with a function call, each as KEY[:LABEL]
#[derive(Args, Debug, Default)]
pub struct ContextArgs {
    /// Send the selected account under KEY
    #[clap(long, value_name = "KEY[:LABEL]")]
    pub account_context: Option<String>,

    /// Send the selected service under KEY
    #[clap(long, value_name = "KEY[:LABEL]")]
    pub service_context: Option<String>,

    /// Send the current menu under KEY
    #[clap(long, value_name = "KEY[:LABEL]")]
    pub menu_context: Option<String>,

    /// Clear all context flags before applying the ones given
    #[clap(long)]
    pub no_context: bool,
}
