//! Named entity groups
//!
//! A [`Group`] is a shared handle to a list of entity ids owned by game code.
//! The collision detector only keeps a handle: entities pushed into the group
//! later are picked up on the next check without re-registration.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::world::EntityId;

/// Shared, mutable, ordered collection of entity ids.
///
/// Cloning a group clones the handle, not the contents; every clone sees the
/// same list.
#[derive(Debug, Clone, Default)]
pub struct Group {
    members: Rc<RefCell<Vec<EntityId>>>,
}

impl Group {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group holding the given ids
    pub fn from_ids(ids: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            members: Rc::new(RefCell::new(ids.into_iter().collect())),
        }
    }

    /// Append an entity. Duplicates are allowed.
    pub fn push(&self, id: EntityId) {
        self.members.borrow_mut().push(id);
    }

    /// Remove the first occurrence of an entity. Returns false if absent.
    pub fn remove(&self, id: EntityId) -> bool {
        let mut members = self.members.borrow_mut();
        match members.iter().position(|&member| member == id) {
            Some(index) => {
                members.remove(index);
                true
            }
            None => false,
        }
    }

    /// Check if the group lists an entity
    pub fn contains(&self, id: EntityId) -> bool {
        self.members.borrow().contains(&id)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.borrow().len()
    }

    /// Check if the group is empty
    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }

    /// Remove all members
    pub fn clear(&self) {
        self.members.borrow_mut().clear();
    }

    /// Copy of the current members, in order
    pub fn snapshot(&self) -> Vec<EntityId> {
        self.members.borrow().clone()
    }

    /// Check if both handles refer to the same underlying collection
    pub fn same_collection(&self, other: &Group) -> bool {
        Rc::ptr_eq(&self.members, &other.members)
    }
}

impl FromIterator<EntityId> for Group {
    fn from_iter<I: IntoIterator<Item = EntityId>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

/// Name to group mapping
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: HashMap<String, Group>,
}

impl GroupRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group under a name, replacing any previous group with that
    /// name. Returns the replaced group.
    pub fn register(&mut self, name: impl Into<String>, group: Group) -> Option<Group> {
        self.groups.insert(name.into(), group)
    }

    /// Remove a group by name
    pub fn remove(&mut self, name: &str) -> Option<Group> {
        self.groups.remove(name)
    }

    /// Look up a group by name
    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Number of registered groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no groups are registered
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Registered group names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Remove all groups
    pub fn clear(&mut self) {
        self.groups.clear();
    }
}
