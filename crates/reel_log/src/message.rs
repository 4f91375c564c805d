//! Recorded mutation messages.
//!
//! A closed set of message kinds. Every variant carries the recording time
//! and the id of the node it targets; the remaining fields depend on the kind.

use crate::cursor::Timed;
use reel_core::{NodeId, SessionTime};
use serde::{Deserialize, Serialize};

/// Start of a new document; wipes the replayed tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDocument {
    pub time: SessionTime,
    #[serde(default)]
    pub id: NodeId,
}

/// New empty text node inserted at (parent, index)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTextNode {
    pub time: SessionTime,
    pub id: NodeId,
    #[serde(default)]
    pub parent_id: NodeId,
    #[serde(default)]
    pub index: usize,
}

/// New element inserted at (parent, index)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateElementNode {
    pub time: SessionTime,
    pub id: NodeId,
    #[serde(default)]
    pub parent_id: NodeId,
    #[serde(default)]
    pub index: usize,
    pub tag: String,
    #[serde(default)]
    pub svg: bool,
}

/// Existing node reinserted at (parent, index)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveNode {
    pub time: SessionTime,
    pub id: NodeId,
    pub parent_id: NodeId,
    #[serde(default)]
    pub index: usize,
}

/// Node detached from its parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveNode {
    pub time: SessionTime,
    pub id: NodeId,
}

/// Attribute set on an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetNodeAttribute {
    pub time: SessionTime,
    pub id: NodeId,
    pub name: String,
    pub value: String,
}

/// Attribute removed from an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveNodeAttribute {
    pub time: SessionTime,
    pub id: NodeId,
    pub name: String,
}

/// Value typed into an input-like element
///
/// A positive `mask` means the recorder hid the value; replay shows that many
/// placeholder characters instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInputValue {
    pub time: SessionTime,
    pub id: NodeId,
    pub value: String,
    #[serde(default)]
    pub mask: u32,
}

/// Checked state of a checkbox or radio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInputChecked {
    pub time: SessionTime,
    pub id: NodeId,
    pub checked: bool,
}

/// Character data of a text node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetNodeData {
    pub time: SessionTime,
    pub id: NodeId,
    pub data: String,
}

/// Rule inserted into a stylesheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssInsertRule {
    pub time: SessionTime,
    pub id: NodeId,
    pub rule: String,
    #[serde(default)]
    pub index: usize,
}

/// Rule deleted from a stylesheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssDeleteRule {
    pub time: SessionTime,
    pub id: NodeId,
    pub index: usize,
}

/// Nested document (frame) or shadow boundary opened under a host node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIFrameDocument {
    pub time: SessionTime,
    pub id: NodeId,
    pub frame_id: NodeId,
}

/// Scroll offset of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetNodeScroll {
    pub time: SessionTime,
    pub id: NodeId,
    pub x: i64,
    pub y: i64,
}

/// One recorded mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tp", rename_all = "snake_case")]
pub enum Message {
    CreateDocument(CreateDocument),
    CreateTextNode(CreateTextNode),
    CreateElementNode(CreateElementNode),
    MoveNode(MoveNode),
    RemoveNode(RemoveNode),
    SetNodeAttribute(SetNodeAttribute),
    RemoveNodeAttribute(RemoveNodeAttribute),
    SetInputValue(SetInputValue),
    SetInputChecked(SetInputChecked),
    SetNodeData(SetNodeData),
    SetCssData(SetNodeData),
    CssInsertRule(CssInsertRule),
    CssDeleteRule(CssDeleteRule),
    #[serde(rename = "create_i_frame_document")]
    CreateIFrameDocument(CreateIFrameDocument),
    SetNodeScroll(SetNodeScroll),
}

impl Message {
    /// Recording time of the message
    #[must_use]
    pub fn time(&self) -> SessionTime {
        match self {
            Self::CreateDocument(m) => m.time,
            Self::CreateTextNode(m) => m.time,
            Self::CreateElementNode(m) => m.time,
            Self::MoveNode(m) => m.time,
            Self::RemoveNode(m) => m.time,
            Self::SetNodeAttribute(m) => m.time,
            Self::RemoveNodeAttribute(m) => m.time,
            Self::SetInputValue(m) => m.time,
            Self::SetInputChecked(m) => m.time,
            Self::SetNodeData(m) | Self::SetCssData(m) => m.time,
            Self::CssInsertRule(m) => m.time,
            Self::CssDeleteRule(m) => m.time,
            Self::CreateIFrameDocument(m) => m.time,
            Self::SetNodeScroll(m) => m.time,
        }
    }

    /// Node the message targets
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Self::CreateDocument(m) => m.id,
            Self::CreateTextNode(m) => m.id,
            Self::CreateElementNode(m) => m.id,
            Self::MoveNode(m) => m.id,
            Self::RemoveNode(m) => m.id,
            Self::SetNodeAttribute(m) => m.id,
            Self::RemoveNodeAttribute(m) => m.id,
            Self::SetInputValue(m) => m.id,
            Self::SetInputChecked(m) => m.id,
            Self::SetNodeData(m) | Self::SetCssData(m) => m.id,
            Self::CssInsertRule(m) => m.id,
            Self::CssDeleteRule(m) => m.id,
            Self::CreateIFrameDocument(m) => m.id,
            Self::SetNodeScroll(m) => m.id,
        }
    }

    /// Wire name of the message kind
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::CreateDocument(_) => "create_document",
            Self::CreateTextNode(_) => "create_text_node",
            Self::CreateElementNode(_) => "create_element_node",
            Self::MoveNode(_) => "move_node",
            Self::RemoveNode(_) => "remove_node",
            Self::SetNodeAttribute(_) => "set_node_attribute",
            Self::RemoveNodeAttribute(_) => "remove_node_attribute",
            Self::SetInputValue(_) => "set_input_value",
            Self::SetInputChecked(_) => "set_input_checked",
            Self::SetNodeData(_) => "set_node_data",
            Self::SetCssData(_) => "set_css_data",
            Self::CssInsertRule(_) => "css_insert_rule",
            Self::CssDeleteRule(_) => "css_delete_rule",
            Self::CreateIFrameDocument(_) => "create_i_frame_document",
            Self::SetNodeScroll(_) => "set_node_scroll",
        }
    }
}

impl Timed for Message {
    fn time(&self) -> SessionTime {
        Message::time(self)
    }
}

impl Timed for SetNodeScroll {
    fn time(&self) -> SessionTime {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_tag() {
        let msg = Message::CreateElementNode(CreateElementNode {
            time: SessionTime::from_millis(3),
            id: NodeId::new(2),
            parent_id: NodeId::new(1),
            index: 0,
            tag: "BODY".to_string(),
            svg: false,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["tp"], "create_element_node");
        assert_eq!(json["parent_id"], 1);
        assert_eq!(json["tag"], "BODY");
    }

    #[test]
    fn test_iframe_document_wire_name() {
        let json = r#"{"tp":"create_i_frame_document","time":5,"id":9,"frame_id":4}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.kind_name(), "create_i_frame_document");
        assert_eq!(msg.id(), NodeId::new(9));
        assert_eq!(msg.time(), SessionTime::from_millis(5));
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let json = r#"{"tp":"create_document","time":0}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id(), NodeId::ROOT);

        let json = r#"{"tp":"set_input_value","time":1,"id":3,"value":"x"}"#;
        let Message::SetInputValue(m) = serde_json::from_str(json).unwrap() else {
            panic!("wrong kind");
        };
        assert_eq!(m.mask, 0);
    }

    #[test]
    fn test_css_data_shares_payload_with_node_data() {
        let json = r#"{"tp":"set_css_data","time":7,"id":11,"data":"a{}"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, Message::SetCssData(ref m) if m.data == "a{}"));
        assert_eq!(msg.kind_name(), "set_css_data");
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let json = r#"{"tp":"mouse_move","time":1,"id":1}"#;
        assert!(serde_json::from_str::<Message>(json).is_err());
    }
}
