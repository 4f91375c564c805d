//! Message constructors shared by tests.

use reel_core::{NodeId, SessionTime};
use reel_log::message::*;

fn at(t: u64) -> SessionTime {
    SessionTime::from_millis(t)
}

pub fn create_document(t: u64) -> Message {
    Message::CreateDocument(CreateDocument {
        time: at(t),
        id: NodeId::ROOT,
    })
}

pub fn element(t: u64, id: u64, parent: u64, index: usize, tag: &str) -> Message {
    Message::CreateElementNode(CreateElementNode {
        time: at(t),
        id: NodeId::new(id),
        parent_id: NodeId::new(parent),
        index,
        tag: tag.to_string(),
        svg: false,
    })
}

pub fn svg_element(t: u64, id: u64, parent: u64, tag: &str) -> Message {
    Message::CreateElementNode(CreateElementNode {
        time: at(t),
        id: NodeId::new(id),
        parent_id: NodeId::new(parent),
        index: 0,
        tag: tag.to_string(),
        svg: true,
    })
}

pub fn text(t: u64, id: u64, parent: u64, index: usize) -> Message {
    Message::CreateTextNode(CreateTextNode {
        time: at(t),
        id: NodeId::new(id),
        parent_id: NodeId::new(parent),
        index,
    })
}

pub fn move_node(t: u64, id: u64, parent: u64, index: usize) -> Message {
    Message::MoveNode(MoveNode {
        time: at(t),
        id: NodeId::new(id),
        parent_id: NodeId::new(parent),
        index,
    })
}

pub fn remove(t: u64, id: u64) -> Message {
    Message::RemoveNode(RemoveNode {
        time: at(t),
        id: NodeId::new(id),
    })
}

pub fn set_attr(t: u64, id: u64, name: &str, value: &str) -> Message {
    Message::SetNodeAttribute(SetNodeAttribute {
        time: at(t),
        id: NodeId::new(id),
        name: name.to_string(),
        value: value.to_string(),
    })
}

pub fn remove_attr(t: u64, id: u64, name: &str) -> Message {
    Message::RemoveNodeAttribute(RemoveNodeAttribute {
        time: at(t),
        id: NodeId::new(id),
        name: name.to_string(),
    })
}

pub fn input_value(t: u64, id: u64, value: &str, mask: u32) -> Message {
    Message::SetInputValue(SetInputValue {
        time: at(t),
        id: NodeId::new(id),
        value: value.to_string(),
        mask,
    })
}

pub fn input_checked(t: u64, id: u64, checked: bool) -> Message {
    Message::SetInputChecked(SetInputChecked {
        time: at(t),
        id: NodeId::new(id),
        checked,
    })
}

pub fn data(t: u64, id: u64, data: &str) -> Message {
    Message::SetNodeData(SetNodeData {
        time: at(t),
        id: NodeId::new(id),
        data: data.to_string(),
    })
}

pub fn css_data(t: u64, id: u64, data: &str) -> Message {
    Message::SetCssData(SetNodeData {
        time: at(t),
        id: NodeId::new(id),
        data: data.to_string(),
    })
}

pub fn insert_rule(t: u64, id: u64, rule: &str, index: usize) -> Message {
    Message::CssInsertRule(CssInsertRule {
        time: at(t),
        id: NodeId::new(id),
        rule: rule.to_string(),
        index,
    })
}

pub fn delete_rule(t: u64, id: u64, index: usize) -> Message {
    Message::CssDeleteRule(CssDeleteRule {
        time: at(t),
        id: NodeId::new(id),
        index,
    })
}

pub fn frame_document(t: u64, id: u64, frame: u64) -> Message {
    Message::CreateIFrameDocument(CreateIFrameDocument {
        time: at(t),
        id: NodeId::new(id),
        frame_id: NodeId::new(frame),
    })
}

pub fn scroll(t: u64, id: u64, x: i64, y: i64) -> Message {
    Message::SetNodeScroll(SetNodeScroll {
        time: at(t),
        id: NodeId::new(id),
        x,
        y,
    })
}

/// The reference log: html > body > text, data at 10, body scroll at 20
pub fn basic_log() -> Vec<Message> {
    vec![
        create_document(0),
        element(0, 1, 0, 0, "HTML"),
        element(0, 2, 1, 0, "BODY"),
        text(0, 3, 2, 0),
        data(10, 3, "hi"),
        scroll(20, 2, 0, 50),
    ]
}
