//! RotationEngine: the contact-link carousel.
//!
//! Pure state machine; the controller drives it from timers:
//!
//! ```text
//!  every ROTATION_PERIOD   tick()     → new slot Incoming, old slots Outgoing
//!  + SETTLE_DELAY          settle(id) → Incoming → Active
//!  + CROSSFADE             retire(id) → Outgoing slot removed
//! ```
//!
//! Slot ids are never reused, so a timer that outlives a restart finds no
//! matching slot and does nothing.

use std::time::Duration;

use crate::model::{ContactData, LinkItem};

pub const ROTATION_PERIOD: Duration = Duration::from_millis(3000);
pub const CROSSFADE: Duration = Duration::from_millis(500);
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

pub type SlotId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPhase {
    /// Just inserted, not yet visible.
    Incoming,
    Active,
    /// Fading out, removed after [`CROSSFADE`].
    Outgoing,
}

/// One displayed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSlot {
    pub id: SlotId,
    pub link: LinkItem,
    pub phase: SlotPhase,
}

/// What a tick changed; the controller schedules the follow-up timers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub incoming: SlotId,
    pub outgoing: Vec<SlotId>,
}

#[derive(Debug, Default)]
pub struct RotationEngine {
    links: Vec<LinkItem>,
    current_index: usize,
    slots: Vec<LinkSlot>,
    next_id: SlotId,
}

impl RotationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn links(&self) -> &[LinkItem] {
        &self.links
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_link(&self) -> Option<&LinkItem> {
        self.links.get(self.current_index)
    }

    pub fn slots(&self) -> &[LinkSlot] {
        &self.slots
    }

    /// The slot a reader should treat as "the" link right now: the newest
    /// one that isn't fading out.
    pub fn active_slot(&self) -> Option<&LinkSlot> {
        self.slots
            .iter()
            .rev()
            .find(|s| s.phase != SlotPhase::Outgoing)
    }

    /// Re-derive the link list from fresh contact data.  The current index is
    /// kept but wrapped into the new length.
    pub fn set_contact(&mut self, contact: &ContactData) {
        self.set_links(contact.links());
    }

    pub fn set_links(&mut self, links: Vec<LinkItem>) {
        self.links = links;
        self.current_index = if self.links.is_empty() {
            0
        } else {
            self.current_index % self.links.len()
        };
    }

    /// Initial population: index back to 0, a single active slot showing the
    /// first link.
    pub fn populate(&mut self) {
        self.current_index = 0;
        self.slots.clear();
        if let Some(first) = self.links.first().cloned() {
            let id = self.alloc_id();
            self.slots.push(LinkSlot {
                id,
                link: first,
                phase: SlotPhase::Active,
            });
        }
    }

    /// Advance one step.  `None` when there is nothing to rotate.
    pub fn tick(&mut self) -> Option<Transition> {
        if self.links.is_empty() {
            return None;
        }
        self.current_index = (self.current_index + 1) % self.links.len();

        let mut outgoing = Vec::new();
        for slot in self.slots.iter_mut().filter(|s| s.phase != SlotPhase::Outgoing) {
            slot.phase = SlotPhase::Outgoing;
            outgoing.push(slot.id);
        }

        let id = self.alloc_id();
        self.slots.push(LinkSlot {
            id,
            link: self.links[self.current_index].clone(),
            phase: SlotPhase::Incoming,
        });

        Some(Transition {
            incoming: id,
            outgoing,
        })
    }

    /// Incoming → Active.  Returns whether anything changed.
    pub fn settle(&mut self, id: SlotId) -> bool {
        match self.slots.iter_mut().find(|s| s.id == id) {
            Some(slot) if slot.phase == SlotPhase::Incoming => {
                slot.phase = SlotPhase::Active;
                true
            }
            _ => false,
        }
    }

    /// Drop an outgoing slot.  Returns whether anything changed.
    pub fn retire(&mut self, id: SlotId) -> bool {
        let before = self.slots.len();
        self.slots
            .retain(|s| !(s.id == id && s.phase == SlotPhase::Outgoing));
        self.slots.len() != before
    }

    /// Forget everything (teardown).
    pub fn clear(&mut self) {
        self.links.clear();
        self.slots.clear();
        self.current_index = 0;
    }

    fn alloc_id(&mut self) -> SlotId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
