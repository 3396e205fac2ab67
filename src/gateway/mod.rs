use crate::error::Result;
use crate::schedule::EventRequest;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// What the bot needs from the chat platform, scoped to one guild.
pub trait Gateway: Send + Sync {
    fn resolve_channel(&self, id: u64) -> impl Future<Output = Option<ChannelRef>> + Send;

    fn resolve_role(&self, id: u64) -> impl Future<Output = Option<RoleRef>> + Send;

    /// Returns the id of the sent message.
    fn send_message(
        &self,
        channel_id: u64,
        content: &str,
    ) -> impl Future<Output = std::result::Result<u64, GatewayError>> + Send;

    fn delete_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> impl Future<Output = std::result::Result<(), GatewayError>> + Send;

    /// Fails with `WatchError::EventCreationFailed`.
    fn create_scheduled_event(&self, event: &EventRequest) -> impl Future<Output = Result<()>> + Send;

    fn add_role(
        &self,
        user_id: u64,
        role_id: u64,
    ) -> impl Future<Output = std::result::Result<(), GatewayError>> + Send;

    fn guild_name(&self) -> impl Future<Output = Option<String>> + Send;

    fn latency(&self) -> impl Future<Output = Option<Duration>> + Send;
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("missing permissions")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("gateway request failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: u64,
    pub name: String,
}

impl ChannelRef {
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRef {
    pub id: u64,
    pub name: String,
}

pub fn user_mention(user_id: u64) -> String {
    format!("<@{}>", user_id)
}

/// Reads a `<#123>` channel mention.
pub fn parse_channel_mention(text: &str) -> Option<u64> {
    text.strip_prefix("<#")?.strip_suffix('>')?.parse().ok()
}
