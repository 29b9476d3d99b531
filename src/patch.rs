use serde::{Deserialize, Serialize};

use crate::error::PatchError;

/// One server-issued instruction, tagged on the wire by `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Patch {
    ReplaceInner {
        selector: String,
        html: String,
    },
    ReplaceOuter {
        selector: String,
        html: String,
    },
    SetAttribute {
        selector: String,
        name: String,
        value: String,
    },
    RemoveAttribute {
        selector: String,
        name: String,
    },
    SetText {
        selector: String,
        text: String,
    },
    AppendChild {
        selector: String,
        html: String,
    },
    PrependChild {
        selector: String,
        html: String,
    },
    ReplaceChild {
        selector: String,
        index: usize,
        html: String,
    },
    RemoveElement {
        selector: String,
    },
    AttachEvent {
        selector: String,
        event: String,
    },
    DetachEvent {
        selector: String,
        event: String,
    },
    Batch {
        patches: Vec<Patch>,
    },
    /// Any `type` this client does not know. Applying it is a logged no-op.
    #[serde(other)]
    Unknown,
}

impl Patch {
    pub fn kind(&self) -> &'static str {
        match self {
            Patch::ReplaceInner { .. } => "ReplaceInner",
            Patch::ReplaceOuter { .. } => "ReplaceOuter",
            Patch::SetAttribute { .. } => "SetAttribute",
            Patch::RemoveAttribute { .. } => "RemoveAttribute",
            Patch::SetText { .. } => "SetText",
            Patch::AppendChild { .. } => "AppendChild",
            Patch::PrependChild { .. } => "PrependChild",
            Patch::ReplaceChild { .. } => "ReplaceChild",
            Patch::RemoveElement { .. } => "RemoveElement",
            Patch::AttachEvent { .. } => "AttachEvent",
            Patch::DetachEvent { .. } => "DetachEvent",
            Patch::Batch { .. } => "Batch",
            Patch::Unknown => "Unknown",
        }
    }

    pub fn selector(&self) -> Option<&str> {
        match self {
            Patch::ReplaceInner { selector, .. }
            | Patch::ReplaceOuter { selector, .. }
            | Patch::SetAttribute { selector, .. }
            | Patch::RemoveAttribute { selector, .. }
            | Patch::SetText { selector, .. }
            | Patch::AppendChild { selector, .. }
            | Patch::PrependChild { selector, .. }
            | Patch::ReplaceChild { selector, .. }
            | Patch::RemoveElement { selector }
            | Patch::AttachEvent { selector, .. }
            | Patch::DetachEvent { selector, .. } => Some(selector),
            Patch::Batch { .. } | Patch::Unknown => None,
        }
    }
}

/// Decode one inbound text message.
pub fn decode(message: &str) -> Result<Patch, PatchError> {
    Ok(serde_json::from_str(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_attach_event() {
        let patch = decode(r##"{"type":"AttachEvent","selector":"#btn","event":"click"}"##).unwrap();
        assert_eq!(
            patch,
            Patch::AttachEvent {
                selector: "#btn".into(),
                event: "click".into()
            }
        );
    }

    #[test]
    fn decodes_nested_batch() {
        let patch = decode(
            r##"{"type":"Batch","patches":[
                {"type":"RemoveElement","selector":".gone"},
                {"type":"Batch","patches":[{"type":"ReplaceChild","selector":"ul","index":2,"html":"<li></li>"}]}
            ]}"##,
        )
        .unwrap();
        let Patch::Batch { patches } = patch else {
            panic!("expected batch");
        };
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[1].kind(), "Batch");
    }

    #[test]
    fn unknown_type_decodes_to_unknown() {
        let patch = decode(r#"{"type":"Teleport","selector":"p","where":"moon"}"#).unwrap();
        assert_eq!(patch, Patch::Unknown);

        let batch = decode(r#"{"type":"Batch","patches":[{"type":"Morph"}]}"#).unwrap();
        assert_eq!(
            batch,
            Patch::Batch {
                patches: vec![Patch::Unknown]
            }
        );
    }

    #[test]
    fn malformed_messages_are_decode_errors() {
        for message in [
            "not json",
            "[]",
            r#"{"selector":"p"}"#,
            r#"{"type":"ReplaceInner","selector":"p"}"#,
            r#"{"type":"ReplaceChild","selector":"p","index":-1,"html":""}"#,
        ] {
            assert!(
                matches!(decode(message), Err(PatchError::Decode(_))),
                "{message} should fail to decode"
            );
        }
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(Patch::RemoveAttribute {
            selector: "p".into(),
            name: "hidden".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "RemoveAttribute");
        assert_eq!(json["name"], "hidden");
    }
}
