use std::collections::HashMap;
use std::rc::Rc;

use kuchiki::NodeRef;
use tracing::{debug, trace, warn};

use crate::dom;
use crate::error::LedgerError;
use crate::ledger::Ledger;

/// Handlers attached to a single element. Holding the `NodeRef` keeps the key
/// address stable, and a leaked entry keeps its detached node alive the same
/// way a forgotten DOM listener would.
struct Attachment {
    node: NodeRef,
    events: Ledger,
}

/// Tracks which (element, event type) pairs currently route to the shared
/// forwarding handler, kept equal to each element's ledger attribute.
pub struct ListenerRegistry {
    ledger_attribute: String,
    attached: HashMap<usize, Attachment>,
}

fn node_key(node: &NodeRef) -> usize {
    Rc::as_ptr(&node.0) as usize
}

impl ListenerRegistry {
    pub fn new(ledger_attribute: impl Into<String>) -> Self {
        Self {
            ledger_attribute: ledger_attribute.into(),
            attached: HashMap::new(),
        }
    }

    pub fn ledger_attribute(&self) -> &str {
        &self.ledger_attribute
    }

    /// Ledger currently declared on `node`'s attribute.
    pub fn ledger(&self, node: &NodeRef) -> Ledger {
        dom::get_attribute(node, &self.ledger_attribute)
            .map(|raw| Ledger::from_attribute(&raw))
            .unwrap_or_default()
    }

    /// Attach handlers for every ledger entry in `root` and its descendants.
    /// Pairs that are already attached are skipped, so repeated calls on an
    /// unchanged subtree are harmless. Returns the number of new attachments.
    pub fn setup(&mut self, root: &NodeRef) -> usize {
        let mut added = 0;
        for node in root.inclusive_descendants() {
            added += self.setup_element(&node);
        }
        if added > 0 {
            debug!(target: "listeners", added, "attached ledger handlers");
        }
        added
    }

    /// Remove every handler held for `root` and its descendants. Must run
    /// before the subtree is discarded or its children are replaced.
    pub fn cleanup(&mut self, root: &NodeRef) -> usize {
        let mut removed = 0;
        for node in root.inclusive_descendants() {
            removed += self.cleanup_element(&node);
        }
        if removed > 0 {
            debug!(target: "listeners", removed, "detached ledger handlers");
        }
        removed
    }

    /// Re-derive handlers for `node` alone from its current ledger attribute.
    pub fn resync(&mut self, node: &NodeRef) {
        self.cleanup_element(node);
        self.setup_element(node);
    }

    /// Add `event_type` to the element's ledger and attach its handler.
    pub fn attach(&mut self, node: &NodeRef, event_type: &str) -> Result<bool, LedgerError> {
        let mut ledger = self.ledger(node);
        if ledger.insert(event_type)? {
            dom::set_attribute(node, &self.ledger_attribute, &ledger.to_string());
        }
        Ok(self.attach_handler(node, event_type))
    }

    /// Remove `event_type` from the element's ledger and detach its handler.
    /// Detaching an absent event type is a no-op.
    pub fn detach(&mut self, node: &NodeRef, event_type: &str) -> bool {
        let mut ledger = self.ledger(node);
        if ledger.remove(event_type) {
            if ledger.is_empty() {
                dom::remove_attribute(node, &self.ledger_attribute);
            } else {
                dom::set_attribute(node, &self.ledger_attribute, &ledger.to_string());
            }
        }
        self.detach_handler(node, event_type)
    }

    pub fn is_attached(&self, node: &NodeRef, event_type: &str) -> bool {
        self.attached
            .get(&node_key(node))
            .is_some_and(|attachment| attachment.events.contains(event_type))
    }

    /// Event types with a handler on `node`, in attachment order.
    pub fn attached_events(&self, node: &NodeRef) -> Vec<String> {
        self.attached
            .get(&node_key(node))
            .map(|attachment| attachment.events.iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Total number of attached (element, event type) pairs.
    pub fn handler_count(&self) -> usize {
        self.attached
            .values()
            .map(|attachment| attachment.events.len())
            .sum()
    }

    /// Attachments whose element is no longer reachable from `root`.
    pub fn leaked(&self, root: &NodeRef) -> usize {
        self.attached
            .values()
            .filter(|attachment| !dom::is_connected(&attachment.node, root))
            .map(|attachment| attachment.events.len())
            .sum()
    }

    fn setup_element(&mut self, node: &NodeRef) -> usize {
        let ledger = self.ledger(node);
        ledger
            .iter()
            .filter(|event_type| self.attach_handler(node, event_type))
            .count()
    }

    fn cleanup_element(&mut self, node: &NodeRef) -> usize {
        self.attached
            .remove(&node_key(node))
            .map(|attachment| attachment.events.len())
            .unwrap_or(0)
    }

    fn attach_handler(&mut self, node: &NodeRef, event_type: &str) -> bool {
        if let Err(err) = Ledger::validate(event_type) {
            warn!(target: "listeners", event_type, error = %err, "ledger declares an event type that cannot be attached");
            return false;
        }
        let attachment = self
            .attached
            .entry(node_key(node))
            .or_insert_with(|| Attachment {
                node: node.clone(),
                events: Ledger::new(),
            });
        let added = attachment.events.insert(event_type).unwrap_or(false);
        if added {
            trace!(target: "listeners", event_type, "handler attached");
        }
        added
    }

    fn detach_handler(&mut self, node: &NodeRef, event_type: &str) -> bool {
        let key = node_key(node);
        let Some(attachment) = self.attached.get_mut(&key) else {
            return false;
        };
        let removed = attachment.events.remove(event_type);
        if attachment.events.is_empty() {
            self.attached.remove(&key);
        }
        if removed {
            trace!(target: "listeners", event_type, "handler detached");
        }
        removed
    }
}
