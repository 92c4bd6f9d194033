//! In-memory display tree
//!
//! The default [`RenderTarget`]: an ordered list of output slots. Slots can be
//! reserved ahead of their content so that deferred renders keep the order in
//! which they were started. A removed slot stays detached so later slot ids
//! keep their positions. Every clear starts a new generation; slots from an
//! older generation are detached and can no longer be filled.

use serde::{Deserialize, Serialize};

use super::fragment::Fragment;
use crate::error::AttachError;
use crate::sink::RenderTarget;

/// Handle to one slot of a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId {
    pub generation: u64,
    pub index: usize,
}

#[derive(Debug, Clone)]
enum Slot {
    Reserved,
    Filled(Fragment),
    Removed,
}

/// Output slots in insertion order
#[derive(Debug, Clone, Default)]
pub struct DisplayTree {
    generation: u64,
    slots: Vec<Slot>,
}

impl DisplayTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Filled children in slot order
    pub fn children(&self) -> impl Iterator<Item = &Fragment> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Filled(fragment) => Some(fragment),
            _ => None,
        })
    }

    /// Number of filled children
    pub fn len(&self) -> usize {
        self.children().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots reserved but not yet filled
    pub fn pending(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Reserved))
            .count()
    }

    pub fn get(&self, slot: SlotId) -> Option<&Fragment> {
        if !self.is_attached(slot) {
            return None;
        }
        match self.slots.get(slot.index) {
            Some(Slot::Filled(fragment)) => Some(fragment),
            _ => None,
        }
    }

    /// Serialize all filled children to HTML
    pub fn to_html(&self) -> String {
        self.children().map(Fragment::to_html).collect()
    }

    fn slot_id(&self, index: usize) -> SlotId {
        SlotId {
            generation: self.generation,
            index,
        }
    }
}

impl RenderTarget for DisplayTree {
    fn attach(&mut self, fragment: Fragment) -> Result<SlotId, AttachError> {
        self.slots.push(Slot::Filled(fragment));
        Ok(self.slot_id(self.slots.len() - 1))
    }

    fn reserve(&mut self) -> SlotId {
        self.slots.push(Slot::Reserved);
        self.slot_id(self.slots.len() - 1)
    }

    fn fill(&mut self, slot: SlotId, fragment: Fragment) -> Result<(), AttachError> {
        if !self.is_attached(slot) {
            return Err(AttachError(format!(
                "slot {} of generation {} is detached",
                slot.index, slot.generation
            )));
        }
        self.slots[slot.index] = Slot::Filled(fragment);
        Ok(())
    }

    fn remove(&mut self, slot: SlotId) -> Result<(), AttachError> {
        if !self.is_attached(slot) {
            return Err(AttachError(format!(
                "slot {} of generation {} is detached",
                slot.index, slot.generation
            )));
        }
        self.slots[slot.index] = Slot::Removed;
        Ok(())
    }

    fn is_attached(&self, slot: SlotId) -> bool {
        slot.generation == self.generation
            && matches!(
                self.slots.get(slot.index),
                Some(Slot::Reserved | Slot::Filled(_))
            )
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_slot_keeps_order() {
        let mut tree = DisplayTree::new();
        let first = tree.reserve();
        tree.attach(Fragment::div().with_text("second")).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.pending(), 1);

        tree.fill(first, Fragment::div().with_text("first")).unwrap();
        assert_eq!(
            tree.to_html(),
            "<div>first</div><div>second</div>"
        );
        assert_eq!(tree.pending(), 0);
    }

    #[test]
    fn test_clear_detaches_slots() {
        let mut tree = DisplayTree::new();
        let slot = tree.reserve();
        tree.clear();
        assert!(!tree.is_attached(slot));
        assert!(tree.fill(slot, Fragment::div()).is_err());
        assert!(tree.is_empty());
        assert_eq!(tree.generation(), 1);
    }

    #[test]
    fn test_fill_replaces_content() {
        let mut tree = DisplayTree::new();
        let slot = tree.attach(Fragment::div().with_text("a")).unwrap();
        tree.fill(slot, Fragment::div().with_text("ab")).unwrap();
        assert_eq!(tree.get(slot).map(Fragment::text_content).as_deref(), Some("ab"));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_remove_detaches_slot() {
        let mut tree = DisplayTree::new();
        let first = tree.attach(Fragment::div().with_text("a")).unwrap();
        let second = tree.attach(Fragment::div().with_text("b")).unwrap();
        tree.remove(first).unwrap();

        assert!(!tree.is_attached(first));
        assert!(tree.is_attached(second));
        assert!(tree.fill(first, Fragment::div()).is_err());
        assert!(tree.remove(first).is_err());
        assert_eq!(tree.to_html(), "<div>b</div>");
        assert_eq!(tree.pending(), 0);
    }
}
