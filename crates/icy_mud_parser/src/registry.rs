//! User and server defined markup: elements, entities and line tags.
//!
//! Every entry remembers where it came from. Server definitions may not
//! silently replace the user's own customizations, which is what keeps a
//! hostile server from rewriting local elements.

use std::collections::HashMap;
use std::hash::Hash;

/// Who defined an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Defined by the user (client side input).
    Local,
    /// Defined by the server.
    Remote,
}

impl Origin {
    pub fn from_remote(remote: bool) -> Self {
        if remote { Origin::Remote } else { Origin::Local }
    }
}

pub trait RegistryEntry {
    fn origin(&self) -> Origin;

    /// Whether a definition coming from `incoming` may replace or delete this entry.
    fn replaceable_by(&self, incoming: Origin) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub definition: String,
    pub close_definition: String,
    /// Declared attributes in positional order with their default values.
    pub attributes: Vec<(String, String)>,
    pub tag: Option<u8>,
    pub flag: Option<String>,
    pub open: bool,
    pub empty: bool,
    pub origin: Origin,
}

impl Element {
    pub fn new(name: impl Into<String>, origin: Origin) -> Self {
        Self {
            name: name.into(),
            definition: String::new(),
            close_definition: String::new(),
            attributes: Vec::new(),
            tag: None,
            flag: None,
            open: false,
            empty: false,
            origin,
        }
    }

    /// Parses an attribute list like `name color=red 'size'` into the element.
    pub fn set_attributes(&mut self, list: &str) {
        self.attributes.clear();
        for item in crate::mxp::split_args(list) {
            let (name, value) = match item.split_once('=') {
                Some((name, value)) => (name, crate::mxp::strip_quotes(value)),
                None => (item.as_str(), ""),
            };
            let name = crate::mxp::strip_quotes(name).to_ascii_lowercase();
            if name.is_empty() {
                continue;
            }
            self.attributes.push((name, value.to_string()));
        }
    }
}

impl RegistryEntry for Element {
    fn origin(&self) -> Origin {
        self.origin
    }

    fn replaceable_by(&self, incoming: Origin) -> bool {
        match self.origin {
            Origin::Remote => incoming == Origin::Remote,
            Origin::Local => self.open || incoming == Origin::Local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    pub value: String,
    pub description: String,
    pub publish: bool,
    pub origin: Origin,
}

impl RegistryEntry for Entity {
    fn origin(&self) -> Origin {
        self.origin
    }

    fn replaceable_by(&self, incoming: Origin) -> bool {
        self.origin == incoming
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTag {
    pub index: u8,
    pub window: Option<String>,
    pub gag: bool,
    pub fore: Option<String>,
    pub back: Option<String>,
    pub enabled: bool,
    pub origin: Origin,
    /// Element bound through `<!ELEMENT ... TAG=n>`.
    pub element: Option<String>,
    pub definition: String,
    pub close_definition: String,
}

impl LineTag {
    pub fn new(index: u8, origin: Origin) -> Self {
        Self {
            index,
            window: None,
            gag: false,
            fore: None,
            back: None,
            enabled: true,
            origin,
            element: None,
            definition: String::new(),
            close_definition: String::new(),
        }
    }

    /// Rebuilds the color markup spliced around lines of this type.
    pub fn update_definition(&mut self) {
        let quoted = |v: &Option<String>| v.as_ref().filter(|s| !s.is_empty()).cloned();
        match (quoted(&self.fore), quoted(&self.back)) {
            (Some(fore), Some(back)) => self.definition = format!("<C \"{fore}\" \"{back}\">"),
            (Some(fore), None) => self.definition = format!("<C \"{fore}\">"),
            (None, Some(back)) => self.definition = format!("<C BACK=\"{back}\">"),
            (None, None) => {
                self.definition.clear();
                self.close_definition.clear();
                return;
            }
        }
        self.close_definition = "</C>".to_string();
    }
}

impl RegistryEntry for LineTag {
    fn origin(&self) -> Origin {
        self.origin
    }

    // the server may always override line tags; the user only their own
    fn replaceable_by(&self, incoming: Origin) -> bool {
        incoming == Origin::Remote || self.origin == Origin::Local
    }
}

#[derive(Debug, Clone)]
pub struct Registry<K, T> {
    entries: HashMap<K, T>,
}

impl<K, T> Default for Registry<K, T> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<K: Eq + Hash + std::fmt::Debug, T: RegistryEntry> Registry<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn may_define(&self, key: &K, incoming: Origin) -> bool {
        self.entries.get(key).is_none_or(|existing| existing.replaceable_by(incoming))
    }

    /// Inserts or replaces `entry`. A disallowed override is dropped and reported as `false`.
    pub fn define(&mut self, key: K, entry: T) -> bool {
        if !self.may_define(&key, entry.origin()) {
            log::trace!("rejected override of {:?} by {:?} definition", key, entry.origin());
            return false;
        }
        self.entries.insert(key, entry);
        true
    }

    pub fn remove(&mut self, key: &K, incoming: Origin) -> bool {
        if !self.may_define(key, incoming) {
            log::trace!("rejected delete of {:?} by {:?}", key, incoming);
            return false;
        }
        self.entries.remove(key).is_some()
    }

    /// Drops everything the server defined, keeping local entries.
    pub fn clear_remote(&mut self) {
        self.entries.retain(|_, entry| entry.origin() == Origin::Local);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }
}

/// The three markup tables of one session.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub elements: Registry<String, Element>,
    pub entities: Registry<String, Entity>,
    pub line_tags: Registry<u8, LineTag>,
}

impl Registries {
    pub fn clear(&mut self) {
        self.elements.clear();
        self.entities.clear();
        self.line_tags.clear();
    }

    pub fn clear_remote(&mut self) {
        self.elements.clear_remote();
        self.entities.clear_remote();
        self.line_tags.clear_remote();
    }
}
