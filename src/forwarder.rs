use kuchiki::NodeRef;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::dom;

/// Outbound half of the connection as seen by the forwarder.
pub trait Outbound {
    fn is_open(&self) -> bool;
    /// Non-blocking send. Returns false if the message could not be queued.
    fn send(&self, message: String) -> bool;
}

/// `Outbound` backed by the transport's channel. Reports closed once the
/// transport has dropped its receiver.
pub struct ChannelOutbound {
    sender: UnboundedSender<String>,
}

impl ChannelOutbound {
    pub fn new(sender: UnboundedSender<String>) -> Self {
        Self { sender }
    }
}

impl Outbound for ChannelOutbound {
    fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    fn send(&self, message: String) -> bool {
        self.sender.send(message).is_ok()
    }
}

/// A DOM event reaching one listening element.
#[derive(Clone)]
pub struct DomEvent {
    pub event_type: String,
    /// Element the event originated on.
    pub target: NodeRef,
    /// Element whose handler is running.
    pub current_target: NodeRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Forwarded {
    Sent(String),
    /// Channel absent or not open; the event is dropped.
    ChannelClosed(String),
    MissingIdentifier,
}

/// The single handler every registered (element, event type) pair routes to.
pub struct EventForwarder {
    id_attribute: String,
    outbound: Option<Box<dyn Outbound>>,
}

pub fn composite_id(element_id: &str, event_type: &str) -> String {
    format!("{element_id}_{event_type}")
}

impl EventForwarder {
    pub fn new(id_attribute: impl Into<String>) -> Self {
        Self {
            id_attribute: id_attribute.into(),
            outbound: None,
        }
    }

    pub fn connect(&mut self, outbound: Box<dyn Outbound>) {
        self.outbound = Some(outbound);
    }

    pub fn disconnect(&mut self) {
        self.outbound = None;
    }

    pub fn is_open(&self) -> bool {
        self.outbound.as_ref().is_some_and(|outbound| outbound.is_open())
    }

    pub fn on_event(&self, event: &DomEvent) -> Forwarded {
        let element_id = dom::get_attribute(&event.target, &self.id_attribute)
            .or_else(|| dom::get_attribute(&event.current_target, &self.id_attribute));
        let Some(element_id) = element_id else {
            debug!(target: "forwarder", event_type = %event.event_type, "event target has no identifier");
            return Forwarded::MissingIdentifier;
        };

        let identifier = composite_id(&element_id, &event.event_type);
        match &self.outbound {
            Some(outbound) if outbound.is_open() => {
                if outbound.send(identifier.clone()) {
                    Forwarded::Sent(identifier)
                } else {
                    debug!(target: "forwarder", %identifier, "channel closed during send");
                    Forwarded::ChannelClosed(identifier)
                }
            }
            _ => {
                debug!(target: "forwarder", %identifier, "channel not open, dropping event");
                Forwarded::ChannelClosed(identifier)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_document, select_all};
    use tokio::sync::mpsc::unbounded_channel;

    fn click_on(document: &NodeRef, selector: &str) -> DomEvent {
        let node = select_all(document, selector).unwrap().remove(0);
        DomEvent {
            event_type: "click".into(),
            target: node.clone(),
            current_target: node,
        }
    }

    #[test]
    fn sends_composite_identifier_when_open() {
        let document = parse_document(r#"<button id="btn" data-id="btn">go</button>"#);
        let (tx, mut rx) = unbounded_channel();
        let mut forwarder = EventForwarder::new("data-id");
        forwarder.connect(Box::new(ChannelOutbound::new(tx)));

        let outcome = forwarder.on_event(&click_on(&document, "#btn"));
        assert_eq!(outcome, Forwarded::Sent("btn_click".into()));
        assert_eq!(rx.try_recv().unwrap(), "btn_click");
    }

    #[test]
    fn drops_event_when_channel_closed() {
        let document = parse_document(r#"<button id="btn" data-id="btn">go</button>"#);
        let (tx, rx) = unbounded_channel();
        drop(rx);
        let mut forwarder = EventForwarder::new("data-id");
        forwarder.connect(Box::new(ChannelOutbound::new(tx)));
        assert!(!forwarder.is_open());

        let outcome = forwarder.on_event(&click_on(&document, "#btn"));
        assert_eq!(outcome, Forwarded::ChannelClosed("btn_click".into()));
    }

    #[test]
    fn drops_event_before_connect() {
        let document = parse_document(r#"<button id="btn" data-id="btn">go</button>"#);
        let forwarder = EventForwarder::new("data-id");
        assert!(matches!(
            forwarder.on_event(&click_on(&document, "#btn")),
            Forwarded::ChannelClosed(_)
        ));
    }

    #[test]
    fn falls_back_to_listening_element_identifier() {
        let document =
            parse_document(r#"<button id="btn" data-id="save"><span id="label">Save</span></button>"#);
        let label = select_all(&document, "#label").unwrap().remove(0);
        let button = select_all(&document, "#btn").unwrap().remove(0);
        let (tx, _rx) = unbounded_channel();
        let mut forwarder = EventForwarder::new("data-id");
        forwarder.connect(Box::new(ChannelOutbound::new(tx)));

        let event = DomEvent {
            event_type: "click".into(),
            target: label,
            current_target: button,
        };
        assert_eq!(forwarder.on_event(&event), Forwarded::Sent("save_click".into()));
    }

    #[test]
    fn missing_identifier_is_reported() {
        let document = parse_document(r#"<button id="btn">go</button>"#);
        let forwarder = EventForwarder::new("data-id");
        assert_eq!(
            forwarder.on_event(&click_on(&document, "#btn")),
            Forwarded::MissingIdentifier
        );
    }
}
