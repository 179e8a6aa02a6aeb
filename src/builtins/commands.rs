use async_trait::async_trait;
use chrono::Utc;

use crate::application::errors::HandlerError;
use crate::application::format::{discord_timestamp_at, format_duration, TimestampStyle};
use crate::domain::entities::{Embed, Interaction, MessagePayload};
use crate::domain::traits::CommandExecutor;
use crate::infrastructure::client::Client;

fn number_option(interaction: &Interaction, name: &str) -> Result<f64, HandlerError> {
    interaction
        .option(name)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| HandlerError::InvalidArgs(format!("`{}` must be a number", name)))
}

/// `/add first second`
pub struct AddCommand;

#[async_trait]
impl CommandExecutor for AddCommand {
    async fn execute(&self, _client: &Client, interaction: &Interaction) -> Result<(), HandlerError> {
        let first = number_option(interaction, "first")?;
        let second = number_option(interaction, "second")?;
        let result = first + second;

        let embed = Embed::new()
            .with_color(0x00FF00)
            .with_title("🧮 Addition Calculator")
            .with_description(format!("{} + {} = {}", first, second, result))
            .with_field("First Number", first.to_string(), true)
            .with_field("Second Number", second.to_string(), true)
            .with_field("Result", format!("**{}**", result), true)
            .with_timestamp(Utc::now())
            .with_footer(format!("Calculated by {}", interaction.user.tag()));

        interaction.reply(MessagePayload::embed(embed)).await?;
        Ok(())
    }
}

/// `/info`
pub struct InfoCommand;

#[async_trait]
impl CommandExecutor for InfoCommand {
    async fn execute(&self, client: &Client, interaction: &Interaction) -> Result<(), HandlerError> {
        let mut embed = Embed::new()
            .with_color(0x0099FF)
            .with_title("Bot Information")
            .with_description("A slash-command bot with hot-reloadable handler modules")
            .with_field("Servers", client.guild_count().to_string(), true)
            .with_field("Members", client.member_count().to_string(), true)
            .with_field("Uptime", format_duration(client.uptime().as_secs()), true);

        if let Some(ready_at) = client.ready_at() {
            embed = embed.with_field("Online since", discord_timestamp_at(ready_at, TimestampStyle::Relative), false);
        }

        let embed = embed
            .with_timestamp(Utc::now())
            .with_footer(format!("Requested by {}", interaction.user.tag()));

        interaction.reply(MessagePayload::embed(embed)).await?;
        Ok(())
    }
}

/// `/ping`
pub struct PingCommand;

#[async_trait]
impl CommandExecutor for PingCommand {
    async fn execute(&self, client: &Client, interaction: &Interaction) -> Result<(), HandlerError> {
        interaction.reply(MessagePayload::text("Pinging...")).await?;

        let latency = (Utc::now() - interaction.created_at).num_milliseconds().max(0);
        let api_latency = client
            .platform()
            .latency()
            .map(|d| format!("{}ms", d.as_millis()))
            .unwrap_or_else(|| "n/a".to_string());

        interaction
            .edit_reply(MessagePayload::text(format!(
                "🏓 Pong!\n📡 Latency: {}ms\n💓 API Latency: {}",
                latency, api_latency
            )))
            .await?;
        Ok(())
    }
}

/// `/whisper` - sends the caller a direct message
pub struct WhisperCommand;

#[async_trait]
impl CommandExecutor for WhisperCommand {
    async fn execute(&self, client: &Client, interaction: &Interaction) -> Result<(), HandlerError> {
        let sent = client
            .platform()
            .send_direct_message(&interaction.user.id, MessagePayload::text("👋 Hey! This is a DM sent via bot."))
            .await;

        let reply = match sent {
            Ok(()) => "📬 I sent you a DM!",
            Err(e) => {
                tracing::error!("Failed to send DM: {}", e);
                "❌ I couldn't send you a DM. Maybe your DMs are disabled?"
            }
        };
        interaction.reply(MessagePayload::text(reply)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{OptionValue, ResponseAction, User};
    use crate::infrastructure::adapters::MemoryPlatform;

    fn user() -> User {
        User::new("42", "alice")
    }

    #[tokio::test]
    async fn test_add_replies_with_sum() {
        let platform = MemoryPlatform::new();
        let client = Client::new(platform.clone());
        let interaction = Interaction::command("add", user(), platform.clone())
            .with_option("first", OptionValue::Integer(2))
            .with_option("second", OptionValue::Number(3.0));

        AddCommand.execute(&client, &interaction).await.unwrap();

        let responses = platform.responses_for(&interaction.target.id);
        let ResponseAction::Reply(payload) = &responses[0] else {
            panic!("expected a reply, got {:?}", responses);
        };
        assert_eq!(payload.embeds[0].description.as_deref(), Some("2 + 3 = 5"));
        assert!(interaction.replied());
    }

    #[tokio::test]
    async fn test_add_without_numbers_fails() {
        let platform = MemoryPlatform::new();
        let client = Client::new(platform.clone());
        let interaction = Interaction::command("add", user(), platform.clone())
            .with_option("first", OptionValue::String("two".to_string()));

        let err = AddCommand.execute(&client, &interaction).await.unwrap_err();
        assert!(matches!(err, HandlerError::InvalidArgs(_)));
        assert!(platform.responses().is_empty());
    }

    #[tokio::test]
    async fn test_ping_replies_then_edits() {
        let platform = MemoryPlatform::new();
        let client = Client::new(platform.clone());
        let interaction = Interaction::command("ping", user(), platform.clone());

        PingCommand.execute(&client, &interaction).await.unwrap();

        let responses = platform.responses_for(&interaction.target.id);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0], ResponseAction::Reply(MessagePayload::text("Pinging...")));
        let ResponseAction::EditReply(edit) = &responses[1] else {
            panic!("expected an edit");
        };
        assert!(edit.content.as_deref().unwrap_or_default().starts_with("🏓 Pong!"));
    }

    #[tokio::test]
    async fn test_ping_latency_counts_from_interaction_creation() {
        let platform = MemoryPlatform::new();
        let client = Client::new(platform.clone());
        let interaction = Interaction::command("ping", user(), platform.clone())
            .with_created_at(Utc::now() - chrono::Duration::milliseconds(1500));

        PingCommand.execute(&client, &interaction).await.unwrap();

        let responses = platform.responses_for(&interaction.target.id);
        let ResponseAction::EditReply(edit) = &responses[1] else {
            panic!("expected an edit");
        };
        let text = edit.content.clone().unwrap_or_default();
        let latency: i64 = text
            .split("Latency: ")
            .nth(1)
            .and_then(|rest| rest.split("ms").next())
            .unwrap()
            .parse()
            .unwrap();
        assert!((1500..5000).contains(&latency), "latency was {}", latency);
        assert!(text.ends_with("API Latency: n/a"));
    }

    #[tokio::test]
    async fn test_whisper_reports_blocked_dms() {
        let platform = MemoryPlatform::new();
        let client = Client::new(platform.clone());

        let ok = Interaction::command("whisper", user(), platform.clone());
        WhisperCommand.execute(&client, &ok).await.unwrap();
        assert_eq!(platform.direct_messages()[0].0, "42");
        assert_eq!(
            platform.responses_for(&ok.target.id),
            vec![ResponseAction::Reply(MessagePayload::text("📬 I sent you a DM!"))]
        );

        platform.set_fail_direct_messages(true);
        let blocked = Interaction::command("whisper", user(), platform.clone());
        WhisperCommand.execute(&client, &blocked).await.unwrap();
        assert_eq!(
            platform.responses_for(&blocked.target.id),
            vec![ResponseAction::Reply(MessagePayload::text(
                "❌ I couldn't send you a DM. Maybe your DMs are disabled?"
            ))]
        );
    }

    #[tokio::test]
    async fn test_info_counts_guilds() {
        use crate::domain::entities::{Event, Guild};

        let platform = MemoryPlatform::new();
        let client = Client::new(platform.clone());
        client.emit(Event::GuildCreate(Guild::new("1", "one", 4))).await;
        let interaction = Interaction::command("info", user(), platform.clone());

        InfoCommand.execute(&client, &interaction).await.unwrap();

        let responses = platform.responses_for(&interaction.target.id);
        let ResponseAction::Reply(payload) = &responses[0] else {
            panic!("expected a reply");
        };
        let servers = payload.embeds[0].fields.iter().find(|f| f.name == "Servers").unwrap();
        assert_eq!(servers.value, "1");
    }
}
