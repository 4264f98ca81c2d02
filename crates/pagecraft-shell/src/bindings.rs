//! Menu item id allocation and click resolution
//!
//! Every installed menu (application menu or popup) gets its own
//! [`ActionTable`]. Ids carry the menu kind and generation, so a click that
//! arrives after the menu was replaced can be told apart from a genuinely
//! unknown id.

use crate::menu::{MenuAction, MenuEntry, MenuNode, NativeRole, TopMenu};
use std::collections::HashMap;

/// Id prefix of application menu items
pub const APP_MENU_PREFIX: char = 'm';
/// Id prefix of popup menu items
pub const POPUP_PREFIX: char = 'c';

/// A menu node with its native id assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundNode {
    Separator,
    /// Item handled by the OS, no id needed
    Native { label: String, accelerator: Option<String>, role: NativeRole },
    Item { id: String, entry: MenuEntry },
    Submenu { label: String, items: Vec<BoundNode> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundMenu {
    pub label: String,
    pub role: Option<crate::menu::MenuRole>,
    pub items: Vec<BoundNode>,
}

/// Outcome of looking up a clicked id
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a> {
    Action(&'a MenuAction),
    /// Id from a menu that has since been replaced
    Stale { generation: u64 },
    Unknown,
}

/// Clicked id split into its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedId {
    pub prefix: char,
    pub generation: u64,
    pub index: u32,
}

/// Parse an id of the form `<prefix><generation>.<index>`
pub fn parse_id(id: &str) -> Option<ParsedId> {
    let mut chars = id.chars();
    let prefix = chars.next()?;
    let (generation, index) = chars.as_str().split_once('.')?;
    Some(ParsedId {
        prefix,
        generation: generation.parse().ok()?,
        index: index.parse().ok()?,
    })
}

pub struct ActionTable {
    prefix: char,
    generation: u64,
    next: u32,
    actions: HashMap<String, MenuAction>,
}

impl ActionTable {
    pub fn new(prefix: char, generation: u64) -> Self {
        Self {
            prefix,
            generation,
            next: 0,
            actions: HashMap::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Allocate an id for `action`
    pub fn register(&mut self, action: MenuAction) -> String {
        let id = format!("{}{}.{}", self.prefix, self.generation, self.next);
        self.next += 1;
        self.actions.insert(id.clone(), action);
        id
    }

    /// Assign ids to every non-native item in `nodes`
    pub fn bind(&mut self, nodes: &[MenuNode]) -> Vec<BoundNode> {
        nodes
            .iter()
            .map(|node| match node {
                MenuNode::Separator => BoundNode::Separator,
                MenuNode::Item(MenuEntry {
                    label,
                    accelerator,
                    action: MenuAction::Native(role),
                }) => BoundNode::Native {
                    label: label.clone(),
                    accelerator: accelerator.clone(),
                    role: *role,
                },
                MenuNode::Item(entry) => BoundNode::Item {
                    id: self.register(entry.action.clone()),
                    entry: entry.clone(),
                },
                MenuNode::Submenu { label, items } => BoundNode::Submenu {
                    label: label.clone(),
                    items: self.bind(items),
                },
            })
            .collect()
    }

    pub fn bind_menus(&mut self, menus: &[TopMenu]) -> Vec<BoundMenu> {
        menus
            .iter()
            .map(|menu| BoundMenu {
                label: menu.label.clone(),
                role: menu.role,
                items: self.bind(&menu.items),
            })
            .collect()
    }

    pub fn resolve(&self, id: &str) -> Resolution<'_> {
        if let Some(action) = self.actions.get(id) {
            return Resolution::Action(action);
        }
        match parse_id(id) {
            Some(parsed) if parsed.prefix == self.prefix && parsed.generation != self.generation => {
                Resolution::Stale {
                    generation: parsed.generation,
                }
            }
            _ => Resolution::Unknown,
        }
    }
}
