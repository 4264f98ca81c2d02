//! Application and context menu descriptions
//!
//! Builds the full application menu as plain data from a fixed skeleton plus
//! the dynamic "Insert" items sent by the front process. The tree is rebuilt
//! from scratch on every setup request and handed to [`crate::native`] for
//! installation; nothing here touches the OS.

use pagecraft_protocol::{FrontCommand, MenuItemDescriptor};
use std::collections::HashSet;
use tracing::warn;

/// Default target of Help ▸ Learn More
pub const DEFAULT_HELP_URL: &str = "http://lab.passiomatic.com/elm-designer";

/// Platform flavour that changes menu layout and accelerators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Dock/menu-bar conventions: application menu, "Bring All to Front",
    /// process survives closing the last window
    MacOs,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }

    pub fn has_app_menu(&self) -> bool {
        matches!(self, Platform::MacOs)
    }

    /// Whether closing every window should terminate the process
    pub fn quits_when_last_window_closes(&self) -> bool {
        !matches!(self, Platform::MacOs)
    }
}

/// Items whose behaviour is supplied by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeRole {
    Cut,
    Copy,
    Paste,
    SelectAll,
    Minimize,
    Close,
    About,
    Services,
    Hide,
    HideOthers,
    ShowAll,
    BringAllToFront,
}

/// What happens when a menu item is activated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// Forward a command to the front process
    Send(FrontCommand),
    /// Handled entirely by the native menu implementation
    Native(NativeRole),
    ToggleFullScreen,
    /// Ask for image files, then forward `InsertImage`
    PickImages,
    OpenExternal(String),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    /// Accelerator in `CmdOrCtrl+Shift+Z` notation
    pub accelerator: Option<String>,
    pub action: MenuAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuNode {
    Separator,
    Item(MenuEntry),
    Submenu { label: String, items: Vec<MenuNode> },
}

impl MenuNode {
    pub fn item(label: impl Into<String>, accelerator: Option<&str>, action: MenuAction) -> Self {
        MenuNode::Item(MenuEntry {
            label: label.into(),
            accelerator: accelerator.map(str::to_string),
            action,
        })
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, MenuNode::Separator)
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            MenuNode::Separator => None,
            MenuNode::Item(entry) => Some(&entry.label),
            MenuNode::Submenu { label, .. } => Some(label),
        }
    }
}

/// Special meaning of a top-level menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuRole {
    App,
    Window,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopMenu {
    pub label: String,
    pub role: Option<MenuRole>,
    pub items: Vec<MenuNode>,
}

/// The complete application menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuTree {
    pub menus: Vec<TopMenu>,
}

impl MenuTree {
    pub fn menu(&self, label: &str) -> Option<&TopMenu> {
        self.menus.iter().find(|m| m.label == label)
    }

    pub fn menu_with_role(&self, role: MenuRole) -> Option<&TopMenu> {
        self.menus.iter().find(|m| m.role == Some(role))
    }

    /// Flattened label outline, `-` for separators. Useful to compare trees
    /// structurally.
    pub fn outline(&self) -> Vec<String> {
        fn walk(prefix: &str, items: &[MenuNode], out: &mut Vec<String>) {
            for node in items {
                match node {
                    MenuNode::Separator => out.push(format!("{}/-", prefix)),
                    MenuNode::Item(entry) => out.push(format!("{}/{}", prefix, entry.label)),
                    MenuNode::Submenu { label, items } => {
                        let path = format!("{}/{}", prefix, label);
                        out.push(path.clone());
                        walk(&path, items, out);
                    }
                }
            }
        }

        let mut out = Vec::new();
        for menu in &self.menus {
            out.push(menu.label.clone());
            walk(&menu.label, &menu.items, &mut out);
        }
        out
    }
}

/// Fixed parts of the application menu
#[derive(Debug, Clone)]
pub struct MenuSkeleton {
    pub app_name: String,
    pub help_url: String,
}

impl MenuSkeleton {
    pub fn new(app_name: impl Into<String>, help_url: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            help_url: help_url.into(),
        }
    }
}

/// Turn the dynamic insert items into menu nodes.
///
/// A separator goes before the first item of every group after the first
/// one; consecutive items of the same group stay together. Every item sends
/// `InsertNode` with its label as payload.
pub fn group_insert_items(items: &[MenuItemDescriptor]) -> Vec<MenuNode> {
    let mut nodes = Vec::with_capacity(items.len() * 2);
    let mut current_group: Option<&str> = None;
    let mut seen_labels = HashSet::new();

    for item in items {
        if let Some(group) = current_group {
            if group != item.group {
                nodes.push(MenuNode::Separator);
            }
        }
        current_group = Some(&item.group);

        if !seen_labels.insert(item.label.as_str()) {
            warn!(label = %item.label, "Duplicate insert menu label, both items insert the same block");
        }

        nodes.push(MenuNode::item(
            item.label.clone(),
            None,
            MenuAction::Send(FrontCommand::InsertNode {
                label: item.label.clone(),
            }),
        ));
    }

    nodes
}

/// Build the whole application menu
pub fn build(skeleton: &MenuSkeleton, dynamic_items: &[MenuItemDescriptor], platform: Platform) -> MenuTree {
    let mut menus = Vec::with_capacity(6);

    if platform.has_app_menu() {
        menus.push(app_menu(&skeleton.app_name));
    }
    menus.push(edit_menu());
    menus.push(insert_menu(dynamic_items));
    menus.push(view_menu(platform));
    menus.push(window_menu(platform));
    menus.push(help_menu(&skeleton.help_url));

    MenuTree { menus }
}

/// Popup shown when right-clicking a page in the page list
pub fn page_context_menu(page_id: &str) -> Vec<MenuNode> {
    vec![MenuNode::item(
        "Delete Page",
        None,
        MenuAction::Send(FrontCommand::PageDelete {
            page_id: page_id.to_string(),
        }),
    )]
}

fn app_menu(app_name: &str) -> TopMenu {
    TopMenu {
        label: app_name.to_string(),
        role: Some(MenuRole::App),
        items: vec![
            MenuNode::item(format!("About {}", app_name), None, MenuAction::Native(NativeRole::About)),
            MenuNode::Separator,
            MenuNode::item("Services", None, MenuAction::Native(NativeRole::Services)),
            MenuNode::Separator,
            MenuNode::item(
                format!("Hide {}", app_name),
                Some("Command+H"),
                MenuAction::Native(NativeRole::Hide),
            ),
            MenuNode::item(
                "Hide Others",
                Some("Command+Shift+H"),
                MenuAction::Native(NativeRole::HideOthers),
            ),
            MenuNode::item("Show All", None, MenuAction::Native(NativeRole::ShowAll)),
            MenuNode::Separator,
            MenuNode::item("Quit", Some("Command+Q"), MenuAction::Quit),
        ],
    }
}

fn edit_menu() -> TopMenu {
    TopMenu {
        label: "Edit".to_string(),
        role: None,
        items: vec![
            MenuNode::item("Undo", Some("CmdOrCtrl+Z"), MenuAction::Send(FrontCommand::UnDo)),
            MenuNode::item("Redo", Some("Shift+CmdOrCtrl+Z"), MenuAction::Send(FrontCommand::ReDo)),
            MenuNode::Separator,
            MenuNode::item("Cut", Some("CmdOrCtrl+X"), MenuAction::Native(NativeRole::Cut)),
            MenuNode::item("Copy", Some("CmdOrCtrl+C"), MenuAction::Native(NativeRole::Copy)),
            MenuNode::item("Paste", Some("CmdOrCtrl+V"), MenuAction::Native(NativeRole::Paste)),
            MenuNode::item("Select All", Some("CmdOrCtrl+A"), MenuAction::Native(NativeRole::SelectAll)),
        ],
    }
}

fn insert_menu(dynamic_items: &[MenuItemDescriptor]) -> TopMenu {
    let mut items = vec![
        MenuNode::item(
            "New Page",
            Some("CmdOrCtrl+Shift+Alt+N"),
            MenuAction::Send(FrontCommand::PageAdd),
        ),
        MenuNode::item("Image…", None, MenuAction::PickImages),
    ];

    if !dynamic_items.is_empty() {
        items.push(MenuNode::Separator);
        items.extend(group_insert_items(dynamic_items));
    }

    TopMenu {
        label: "Insert".to_string(),
        role: None,
        items,
    }
}

fn view_menu(platform: Platform) -> TopMenu {
    let fullscreen = match platform {
        Platform::MacOs => "Ctrl+Command+F",
        Platform::Other => "F11",
    };

    TopMenu {
        label: "View".to_string(),
        role: None,
        items: vec![MenuNode::item(
            "Toggle Full Screen",
            Some(fullscreen),
            MenuAction::ToggleFullScreen,
        )],
    }
}

fn window_menu(platform: Platform) -> TopMenu {
    let mut items = vec![
        MenuNode::item("Minimize", Some("CmdOrCtrl+M"), MenuAction::Native(NativeRole::Minimize)),
        MenuNode::item("Close", Some("CmdOrCtrl+W"), MenuAction::Native(NativeRole::Close)),
    ];

    if platform.has_app_menu() {
        items.push(MenuNode::Separator);
        items.push(MenuNode::item(
            "Bring All to Front",
            None,
            MenuAction::Native(NativeRole::BringAllToFront),
        ));
    }

    TopMenu {
        label: "Window".to_string(),
        role: Some(MenuRole::Window),
        items,
    }
}

fn help_menu(help_url: &str) -> TopMenu {
    TopMenu {
        label: "Help".to_string(),
        role: Some(MenuRole::Help),
        items: vec![MenuNode::item(
            "Learn More",
            None,
            MenuAction::OpenExternal(help_url.to_string()),
        )],
    }
}
