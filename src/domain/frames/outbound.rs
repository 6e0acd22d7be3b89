//! Client → server control frames.

/// A control frame. Built fresh per send and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Start receiving scoped updates for a node.
    SubscribeNode(String),
    /// Stop receiving scoped updates for a node.
    UnsubscribeNode(String),
    /// Ask the backend to push the current state of a node.
    RequestNodeUpdate(String),
}

impl OutboundFrame {
    /// The wire discriminant of this frame.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundFrame::SubscribeNode(_) => "subscribe_node",
            OutboundFrame::UnsubscribeNode(_) => "unsubscribe_node",
            OutboundFrame::RequestNodeUpdate(_) => "request_node_update",
        }
    }

    /// The node name every control frame carries.
    pub fn node_name(&self) -> &str {
        match self {
            OutboundFrame::SubscribeNode(node)
            | OutboundFrame::UnsubscribeNode(node)
            | OutboundFrame::RequestNodeUpdate(node) => node.as_str(),
        }
    }
}

/// What happened to a fire-and-forget send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Handed to the open transport.
    Sent,
    /// Connection not open; nothing was sent.
    NotOpen,
    /// Connection open but the frame could not be handed over.
    Failed,
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }
}
