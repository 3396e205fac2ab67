//! Serenity glue: the [`Gateway`] implementation plus the event handler that
//! routes interactions and member events into the bot.

use crate::commands::{find_command, Bot, CommandSpec, Invocation, OptionKind, OptionValue, Reply, COMMANDS};
use crate::config::Configuration;
use crate::error::{Result, WatchError};
use crate::gateway::{ChannelRef, Gateway, GatewayError, RoleRef};
use crate::media::MediaLookup;
use crate::schedule::EventRequest;
use crate::tenor::GifSearch;
use crate::welcome::{self, NewMember, WelcomeTracker};
use serenity::all::{
    ChannelId, Client, Command, CommandDataOptionValue, CommandInteraction, CommandOptionType,
    Context, CreateAttachment, CreateAutocompleteResponse, CreateCommand, CreateCommandOption,
    CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateScheduledEvent, EditInteractionResponse,
    EventHandler, GatewayIntents, GuildId, Http, Interaction, Member, MessageId,
    Ready, RoleId, ScheduledEventType, User, UserId,
};
use serenity::async_trait;
use serenity::http::HttpError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Gateway calls scoped to one guild, made over the REST API.
pub struct DiscordGateway {
    http: Arc<Http>,
    guild_id: GuildId,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>, guild_id: GuildId) -> Self {
        Self { http, guild_id }
    }
}

fn classify(err: serenity::Error) -> GatewayError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &err {
        match response.status_code.as_u16() {
            403 => return GatewayError::Forbidden,
            404 => return GatewayError::NotFound,
            _ => {}
        }
    }
    GatewayError::Failed(err.to_string())
}

impl Gateway for DiscordGateway {
    async fn resolve_channel(&self, id: u64) -> Option<ChannelRef> {
        if id == 0 {
            return None;
        }
        match self.guild_id.channels(&self.http).await {
            Ok(channels) => channels.get(&ChannelId::new(id)).map(|channel| ChannelRef {
                id,
                name: channel.name.clone(),
            }),
            Err(e) => {
                warn!("Could not list channels of guild {}: {}", self.guild_id, e);
                None
            }
        }
    }

    async fn resolve_role(&self, id: u64) -> Option<RoleRef> {
        if id == 0 {
            return None;
        }
        match self.guild_id.roles(&self.http).await {
            Ok(roles) => roles.get(&RoleId::new(id)).map(|role| RoleRef {
                id,
                name: role.name.clone(),
            }),
            Err(e) => {
                warn!("Could not list roles of guild {}: {}", self.guild_id, e);
                None
            }
        }
    }

    async fn send_message(&self, channel_id: u64, content: &str) -> std::result::Result<u64, GatewayError> {
        let message = ChannelId::new(channel_id)
            .say(&self.http, content)
            .await
            .map_err(classify)?;
        Ok(message.id.get())
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> std::result::Result<(), GatewayError> {
        ChannelId::new(channel_id)
            .delete_message(&self.http, MessageId::new(message_id))
            .await
            .map_err(classify)
    }

    #[instrument(skip(self, event), fields(name = %event.name))]
    async fn create_scheduled_event(&self, event: &EventRequest) -> Result<()> {
        let mut builder = CreateScheduledEvent::new(ScheduledEventType::Voice, &event.name, event.start)
            .channel_id(ChannelId::new(event.channel_id))
            .end_time(event.end)
            .description(&event.description);
        if let Some(image) = &event.image {
            builder = builder.image(&CreateAttachment::bytes(image.clone(), "poster"));
        }

        match self.guild_id.create_scheduled_event(&self.http, builder).await {
            Ok(created) => {
                info!("Created scheduled event {}", created.id);
                Ok(())
            }
            Err(e) => Err(WatchError::EventCreationFailed(e.to_string())),
        }
    }

    async fn add_role(&self, user_id: u64, role_id: u64) -> std::result::Result<(), GatewayError> {
        self.http
            .add_member_role(
                self.guild_id,
                UserId::new(user_id),
                RoleId::new(role_id),
                Some("Welcome role"),
            )
            .await
            .map_err(classify)
    }

    async fn guild_name(&self) -> Option<String> {
        self.guild_id
            .to_partial_guild(&self.http)
            .await
            .ok()
            .map(|guild| guild.name)
    }

    async fn latency(&self) -> Option<Duration> {
        let started = Instant::now();
        self.http.get_current_user().await.ok()?;
        Some(started.elapsed())
    }
}

fn build_command(spec: &CommandSpec) -> CreateCommand {
    let mut command = CreateCommand::new(spec.name).description(spec.description);
    for option in spec.options {
        let kind = match option.kind {
            OptionKind::String => CommandOptionType::String,
            OptionKind::Integer => CommandOptionType::Integer,
            OptionKind::Boolean => CommandOptionType::Boolean,
        };
        let mut built = CreateCommandOption::new(kind, option.name, option.description)
            .required(option.required)
            .set_autocomplete(option.autocomplete);
        if let Some(min) = option.min_value {
            built = built.min_int_value(min as u64);
        }
        for choice in option.choices {
            built = built.add_string_choice(*choice, *choice);
        }
        command = command.add_option(built);
    }
    command
}

fn to_invocation(command: &CommandInteraction) -> Invocation {
    let mut invocation = Invocation::new(command.data.name.clone(), command.channel_id.get());
    for option in &command.data.options {
        let value = match &option.value {
            CommandDataOptionValue::String(s) => OptionValue::String(s.clone()),
            CommandDataOptionValue::Integer(i) => OptionValue::Integer(*i),
            CommandDataOptionValue::Boolean(b) => OptionValue::Boolean(*b),
            other => {
                debug!("Ignoring option {} of unsupported type {:?}", option.name, other.kind());
                continue;
            }
        };
        invocation = invocation.with(&option.name, value);
    }
    invocation
}

pub struct Handler<M, F> {
    bot: Bot<M, F>,
    welcomes: WelcomeTracker,
}

impl<M: MediaLookup, F: GifSearch> Handler<M, F> {
    pub fn new(bot: Bot<M, F>) -> Self {
        Self {
            bot,
            welcomes: WelcomeTracker::new(),
        }
    }

    async fn on_command(&self, ctx: &Context, command: CommandInteraction) {
        let Some(guild_id) = command.guild_id else {
            let reply = Reply::private("Watch parties only work inside a server.");
            self.respond(ctx, &command, reply).await;
            return;
        };

        let invocation = to_invocation(&command);
        let deferred = find_command(&invocation.command).is_some_and(|c| c.deferred);
        if deferred {
            if let Err(e) = command.defer(&ctx.http).await {
                warn!("Could not defer /{}: {}", invocation.command, e);
                return;
            }
        }

        let gateway = DiscordGateway::new(Arc::clone(&ctx.http), guild_id);
        let reply = self.bot.dispatch(&gateway, &invocation).await;

        if deferred {
            self.follow_up(ctx, &command, reply).await;
        } else {
            self.respond(ctx, &command, reply).await;
        }
    }

    async fn respond(&self, ctx: &Context, command: &CommandInteraction, reply: Reply) {
        let message = CreateInteractionResponseMessage::new()
            .content(reply.content)
            .ephemeral(reply.ephemeral);
        if let Err(e) = command
            .create_response(&ctx.http, CreateInteractionResponse::Message(message))
            .await
        {
            error!("Failed to respond to /{}: {}", command.data.name, e);
        }
    }

    /// A deferred response is public, so private replies replace it with an ephemeral follow-up.
    async fn follow_up(&self, ctx: &Context, command: &CommandInteraction, reply: Reply) {
        let result = if reply.ephemeral {
            if let Err(e) = command.delete_response(&ctx.http).await {
                debug!("Could not remove deferred response: {}", e);
            }
            let followup = CreateInteractionResponseFollowup::new()
                .content(reply.content)
                .ephemeral(true);
            command.create_followup(&ctx.http, followup).await.map(|_| ())
        } else {
            let edit = EditInteractionResponse::new().content(reply.content);
            command.edit_response(&ctx.http, edit).await.map(|_| ())
        };

        if let Err(e) = result {
            error!("Failed to answer /{}: {}", command.data.name, e);
        }
    }

    async fn on_autocomplete(&self, ctx: &Context, command: CommandInteraction) {
        let Some(focused) = command.data.autocomplete() else {
            return;
        };
        let titles = self.bot.autocomplete(&command.data.name, focused.value).await;

        let mut response = CreateAutocompleteResponse::new();
        for title in titles {
            response = response.add_string_choice(title.clone(), title);
        }
        if let Err(e) = command
            .create_response(&ctx.http, CreateInteractionResponse::Autocomplete(response))
            .await
        {
            debug!("Autocomplete response failed: {}", e);
        }
    }
}

#[async_trait]
impl<M, F> EventHandler for Handler<M, F>
where
    M: MediaLookup + 'static,
    F: GifSearch + 'static,
{
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is online!", ready.user.name);

        let commands: Vec<CreateCommand> = COMMANDS.iter().map(build_command).collect();
        match Command::set_global_commands(&ctx.http, commands).await {
            Ok(registered) => info!("Registered {} slash commands", registered.len()),
            Err(e) => error!("Failed to register slash commands: {}", e),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => self.on_command(&ctx, command).await,
            Interaction::Autocomplete(command) => self.on_autocomplete(&ctx, command).await,
            _ => {}
        }
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let gateway = DiscordGateway::new(Arc::clone(&ctx.http), new_member.guild_id);
        let member = NewMember {
            user_id: new_member.user.id.get(),
            name: new_member.user.name.clone(),
        };
        welcome::on_member_join(&gateway, &self.bot.config().discord, &self.welcomes, &member).await;
    }

    async fn guild_member_removal(
        &self,
        ctx: Context,
        guild_id: GuildId,
        user: User,
        _member_data_if_available: Option<Member>,
    ) {
        let gateway = DiscordGateway::new(Arc::clone(&ctx.http), guild_id);
        welcome::on_member_leave(
            &gateway,
            &self.bot.config().discord,
            &self.welcomes,
            user.id.get(),
            &user.name,
        )
        .await;
    }
}

/// Connects to the gateway and runs until the connection ends.
pub async fn run<M, F>(config: &Configuration, bot: Bot<M, F>) -> anyhow::Result<()>
where
    M: MediaLookup + 'static,
    F: GifSearch + 'static,
{
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS;
    let mut client = Client::builder(&config.discord.token, intents)
        .event_handler(Handler::new(bot))
        .await?;

    info!("Connecting to Discord");
    client.start().await?;
    Ok(())
}
