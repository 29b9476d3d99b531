use kuchiki::NodeRef;
use tracing::{debug, warn};

use crate::dom;
use crate::error::PatchError;
use crate::patch::Patch;
use crate::registry::ListenerRegistry;

/// Outcome of applying one patch tree.
#[derive(Debug, Default)]
pub struct ApplySummary {
    /// Elements matched by selectors, summed across the tree.
    pub matched: usize,
    /// Matched elements the patch was applied to without error.
    pub applied: usize,
    /// Variants this client does not recognize.
    pub unknown: usize,
    pub errors: Vec<PatchError>,
}

impl ApplySummary {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn merge(&mut self, other: ApplySummary) {
        self.matched += other.matched;
        self.applied += other.applied;
        self.unknown += other.unknown;
        self.errors.extend(other.errors);
    }
}

/// Applies patches to the live document, keeping the listener registry in
/// step with every structural change.
pub struct PatchInterpreter<'a> {
    document: &'a NodeRef,
    registry: &'a mut ListenerRegistry,
}

impl<'a> PatchInterpreter<'a> {
    pub fn new(document: &'a NodeRef, registry: &'a mut ListenerRegistry) -> Self {
        Self { document, registry }
    }

    pub fn apply(&mut self, patch: &Patch) -> ApplySummary {
        let mut summary = ApplySummary::default();
        match patch {
            Patch::Batch { patches } => {
                for child in patches {
                    summary.merge(self.apply(child));
                }
                return summary;
            }
            Patch::Unknown => {
                warn!(target: "patch", "skipping unrecognized patch variant");
                summary.unknown = 1;
                return summary;
            }
            _ => {}
        }

        let Some(selector) = patch.selector() else {
            return summary;
        };
        let targets = match dom::select_all(self.document, selector) {
            Ok(targets) => targets,
            Err(err) => {
                warn!(target: "patch", kind = patch.kind(), error = %err, "selector rejected");
                summary.errors.push(err);
                return summary;
            }
        };
        if targets.is_empty() {
            debug!(target: "patch", kind = patch.kind(), selector, "selector matched nothing");
            return summary;
        }

        summary.matched = targets.len();
        for target in &targets {
            if !dom::is_connected(target, self.document) {
                debug!(target: "patch", kind = patch.kind(), selector, "match left the document earlier in this patch");
                continue;
            }
            match self.apply_to(patch, target) {
                Ok(()) => summary.applied += 1,
                Err(err) => {
                    warn!(target: "patch", kind = patch.kind(), selector, error = %err, "patch failed for matched element");
                    summary.errors.push(err);
                }
            }
        }
        summary
    }

    fn apply_to(&mut self, patch: &Patch, target: &NodeRef) -> Result<(), PatchError> {
        match patch {
            Patch::ReplaceInner { html, .. } => {
                for child in dom::take_children(target) {
                    self.registry.cleanup(&child);
                }
                for node in dom::parse_fragment(html) {
                    target.append(node.clone());
                    self.registry.setup(&node);
                }
            }
            Patch::ReplaceOuter { selector, html } => {
                if target.parent().is_none() {
                    return Err(PatchError::Parentless(selector.clone()));
                }
                self.registry.cleanup(target);
                for node in dom::parse_fragment(html) {
                    target.insert_before(node.clone());
                    self.registry.setup(&node);
                }
                target.detach();
            }
            Patch::SetAttribute { name, value, .. } => {
                dom::set_attribute(target, name, value);
                if name == self.registry.ledger_attribute() {
                    self.registry.resync(target);
                }
            }
            Patch::RemoveAttribute { name, .. } => {
                dom::remove_attribute(target, name);
                if name == self.registry.ledger_attribute() {
                    self.registry.resync(target);
                }
            }
            Patch::SetText { text, .. } => {
                for child in dom::take_children(target) {
                    self.registry.cleanup(&child);
                }
                if !text.is_empty() {
                    target.append(NodeRef::new_text(text.as_str()));
                }
            }
            Patch::AppendChild { html, .. } => {
                for node in dom::parse_fragment(html) {
                    target.append(node.clone());
                    self.registry.setup(&node);
                }
            }
            Patch::PrependChild { html, .. } => {
                let anchor = target.first_child();
                for node in dom::parse_fragment(html) {
                    match &anchor {
                        Some(anchor) => anchor.insert_before(node.clone()),
                        None => target.append(node.clone()),
                    }
                    self.registry.setup(&node);
                }
            }
            Patch::ReplaceChild {
                selector,
                index,
                html,
            } => {
                let Some(old) = dom::child_at(target, *index) else {
                    return Err(PatchError::ChildIndexOutOfRange {
                        selector: selector.clone(),
                        index: *index,
                        len: dom::child_count(target),
                    });
                };
                let Some(replacement) = dom::parse_fragment(html).into_iter().next() else {
                    return Err(PatchError::EmptyFragment(selector.clone()));
                };
                self.registry.cleanup(&old);
                old.insert_before(replacement.clone());
                old.detach();
                self.registry.setup(&replacement);
            }
            Patch::RemoveElement { selector } => {
                if target.parent().is_none() {
                    return Err(PatchError::Parentless(selector.clone()));
                }
                self.registry.cleanup(target);
                target.detach();
            }
            Patch::AttachEvent { event, .. } => {
                self.registry.attach(target, event)?;
            }
            Patch::DetachEvent { event, .. } => {
                self.registry.detach(target, event);
            }
            Patch::Batch { .. } | Patch::Unknown => {}
        }
        Ok(())
    }
}
