use crate::config::DiscordConfig;
use crate::gateway::{user_mention, ChannelRef, Gateway, GatewayError, RoleRef};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// Welcome message ids by member id. Lives only as long as the process.
#[derive(Debug, Default)]
pub struct WelcomeTracker {
    messages: Mutex<HashMap<u64, u64>>,
}

impl WelcomeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember(&self, member_id: u64, message_id: u64) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(member_id, message_id);
    }

    pub fn take(&self, member_id: u64) -> Option<u64> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&member_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub user_id: u64,
    pub name: String,
}

pub fn welcome_text(member_mention: &str, guild_name: &str, support_mention: &str) -> String {
    format!(
        "Welcome {} to **{}**! 🐼\n\n\
         Our aisles are stocked with fun, and the shelves are full of great company. \
         Feel free to browse, chat, and make yourself at home! 🛋️\n\n\
         Need help? Visit {} to open a ticket. Otherwise, enjoy your stay and happy \
         shopping, I mean, chatting! 💕",
        member_mention, guild_name, support_mention
    )
}

/// Gives the member the default role and posts a welcome that can be retracted later.
pub async fn on_member_join<G: Gateway>(
    gateway: &G,
    config: &DiscordConfig,
    tracker: &WelcomeTracker,
    member: &NewMember,
) {
    if let Some(role) = resolve_role(gateway, config.role_id).await {
        match gateway.add_role(member.user_id, role.id).await {
            Ok(()) => info!("Gave {} the role {}", member.name, role.name),
            Err(e) => warn!("Could not give {} the role {}: {}", member.name, role.name, e),
        }
    }

    let (Some(channel), Some(support)) = (
        resolve_channel(gateway, config.welcome_channel_id).await,
        resolve_channel(gateway, config.support_channel_id).await,
    ) else {
        warn!("Welcome or support channel missing, no welcome sent for {}", member.name);
        return;
    };

    let guild_name = gateway.guild_name().await.unwrap_or_else(|| "the server".to_string());
    let text = welcome_text(&user_mention(member.user_id), &guild_name, &support.mention());
    match gateway.send_message(channel.id, &text).await {
        Ok(message_id) => {
            tracker.remember(member.user_id, message_id);
            info!("Sent welcome for {}", member.name);
        }
        Err(e) => warn!("Failed to send welcome for {}: {}", member.name, e),
    }
}

/// Deletes the welcome message of a member who left, if one was sent this run.
pub async fn on_member_leave<G: Gateway>(
    gateway: &G,
    config: &DiscordConfig,
    tracker: &WelcomeTracker,
    user_id: u64,
    name: &str,
) {
    let Some(message_id) = tracker.take(user_id) else {
        return;
    };
    let Some(channel) = resolve_channel(gateway, config.welcome_channel_id).await else {
        return;
    };

    match gateway.delete_message(channel.id, message_id).await {
        Ok(()) => info!("Deleted welcome message for {}", name),
        Err(GatewayError::NotFound) => info!("Welcome message for {} not found", name),
        Err(e) => warn!("Failed to delete welcome message for {}: {}", name, e),
    }
}

async fn resolve_channel<G: Gateway>(gateway: &G, id: Option<u64>) -> Option<ChannelRef> {
    gateway.resolve_channel(id?).await
}

async fn resolve_role<G: Gateway>(gateway: &G, id: Option<u64>) -> Option<RoleRef> {
    gateway.resolve_role(id?).await
}
