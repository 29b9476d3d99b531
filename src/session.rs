use kuchiki::NodeRef;
use tracing::{debug, error, info};

use crate::config::ClientConfig;
use crate::dom;
use crate::forwarder::{DomEvent, EventForwarder, Forwarded, Outbound};
use crate::interpreter::{ApplySummary, PatchInterpreter};
use crate::patch::{self, Patch};
use crate::registry::ListenerRegistry;

/// A user interaction reported by the host UI: an event type fired on every
/// element matching `selector`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub event_type: String,
    pub selector: String,
}

impl Interaction {
    pub fn new(event_type: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            selector: selector.into(),
        }
    }

    /// Parse `"<event> <selector>"`, the selector being the rest of the line.
    pub fn parse(line: &str) -> Option<Self> {
        let (event_type, selector) = line.trim().split_once(char::is_whitespace)?;
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }
        Some(Self::new(event_type, selector))
    }
}

/// Client state for one page load: the live document, its listener registry
/// and the forwarder that reports interactions to the server.
pub struct Session {
    document: NodeRef,
    registry: ListenerRegistry,
    forwarder: EventForwarder,
}

impl Session {
    /// Parse `html` as the initial page and attach every declared listener.
    pub fn new(html: &str, config: &ClientConfig) -> Self {
        Self::from_document(dom::parse_document(html), config)
    }

    pub fn from_document(document: NodeRef, config: &ClientConfig) -> Self {
        let mut registry = ListenerRegistry::new(config.ledger_attribute.clone());
        let attached = registry.setup(&document);
        info!(target: "listeners", attached, "session document ready");
        Self {
            document,
            registry,
            forwarder: EventForwarder::new(config.id_attribute.clone()),
        }
    }

    pub fn document(&self) -> &NodeRef {
        &self.document
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    pub fn connect(&mut self, outbound: impl Outbound + 'static) {
        self.forwarder.connect(Box::new(outbound));
    }

    pub fn disconnect(&mut self) {
        self.forwarder.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.forwarder.is_open()
    }

    /// Decode and apply one inbound message. A message that fails to decode
    /// is logged and dropped; the session carries on.
    pub fn handle_message(&mut self, message: &str) -> Option<ApplySummary> {
        match patch::decode(message) {
            Ok(patch) => Some(self.apply(&patch)),
            Err(err) => {
                error!(target: "patch", error = %err, "discarding undecodable message");
                None
            }
        }
    }

    pub fn apply(&mut self, patch: &Patch) -> ApplySummary {
        let summary = PatchInterpreter::new(&self.document, &mut self.registry).apply(patch);
        debug!(
            target: "patch",
            kind = patch.kind(),
            matched = summary.matched,
            applied = summary.applied,
            errors = summary.errors.len(),
            "applied patch"
        );
        summary
    }

    /// Fire `event_type` at `target`, bubbling through its ancestors. Each
    /// element with a handler for the event type invokes the forwarder once.
    pub fn dispatch(&self, target: &NodeRef, event_type: &str) -> Vec<Forwarded> {
        target
            .inclusive_ancestors()
            .filter(|node| self.registry.is_attached(node, event_type))
            .map(|current_target| {
                self.forwarder.on_event(&DomEvent {
                    event_type: event_type.to_string(),
                    target: target.clone(),
                    current_target,
                })
            })
            .collect()
    }

    /// Dispatch an interaction on each element its selector matches.
    pub fn interact(&self, interaction: &Interaction) -> Vec<Forwarded> {
        let targets = match dom::select_all(&self.document, &interaction.selector) {
            Ok(targets) => targets,
            Err(err) => {
                debug!(target: "forwarder", error = %err, "ignoring interaction");
                return Vec::new();
            }
        };
        targets
            .iter()
            .flat_map(|target| self.dispatch(target, &interaction.event_type))
            .collect()
    }

    pub fn to_html(&self) -> String {
        self.document.to_string()
    }
}
