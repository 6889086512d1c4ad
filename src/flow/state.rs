use serde::{Deserialize, Serialize};

use crate::types::AdapterKind;

/// Screen currently shown by the connection modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentType {
    #[default]
    Connectors,
    Network,
    Connecting,
    About,
    GetWallet,
    Impersonate,
}

/// Everything the presentation layer renders from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionFlowState {
    pub content_type: ContentType,
    pub selected_adapter: Option<AdapterKind>,
    pub active_connector_name: Option<String>,
    pub impersonated_address: String,
    pub is_connected: bool,
    /// Most recent connect failure, cleared when a new attempt starts.
    pub last_error: Option<String>,
}

/// Result of a user action on the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The screen changed.
    Navigated(ContentType),
    /// A connect attempt confirmed a live connection.
    Connected,
    /// A connect attempt failed; the message is also in `last_error`.
    Failed(String),
    /// The flow was reset or torn down while the attempt ran.
    Cancelled,
    /// An external link was opened; the screen is unchanged.
    OpenedLink(String),
    /// Guarded no-op.
    Ignored,
}
