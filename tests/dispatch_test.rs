//! Interaction dispatch through the client, registries and built-in commands
//! Run with: cargo test --test dispatch_test

mod common;

use std::path::Path;
use std::sync::Arc;

use common::*;
use dispatch_bot::application::messaging::{InteractionDispatcher, GENERIC_FAILURE};
use dispatch_bot::application::services::{CommandCatalog, EventCatalog};
use dispatch_bot::application::Bot;
use dispatch_bot::builtins;
use dispatch_bot::domain::entities::{
    Event, Interaction, InteractionKind, MessagePayload, OptionValue, ResponseAction, User,
};
use dispatch_bot::infrastructure::adapters::MemoryPlatform;
use dispatch_bot::infrastructure::config::{Config, Credentials};

const DISPATCH_EVENT: &str = "name: interactionCreate\nexecute: interactionCreate\n";

fn config_for(dir: &Path) -> Config {
    let mut config = Config::default();
    config.modules.commands_dir = dir.join("commands");
    config.modules.events_dir = dir.join("events");
    config
}

fn credentials() -> Credentials {
    Credentials {
        token: Some("test-token".to_string()),
        client_id: None,
        guild_id: None,
    }
}

/// Bot with the test executors and the real dispatcher
async fn test_bot(dir: &Path, platform: Arc<MemoryPlatform>) -> Bot {
    test_bot_recording(dir, platform, calls()).await
}

/// As `test_bot`, with a `record` command logging into `log`
async fn test_bot_recording(dir: &Path, platform: Arc<MemoryPlatform>, log: Calls) -> Bot {
    ensure_init();
    write(dir, "events/interactionCreate.yaml", DISPATCH_EVENT);

    let commands = CommandCatalog::new()
        .with("record", Arc::new(Recorder { label: "record", calls: log }))
        .with("fails_immediately", Arc::new(FailsImmediately))
        .with("fails_after_reply", Arc::new(FailsAfterReply))
        .with("fails_after_defer", Arc::new(FailsAfterDefer))
        .with("panics", Arc::new(Panics { after_reply: false }))
        .with("panics_after_reply", Arc::new(Panics { after_reply: true }));

    let bot = Bot::with_catalogs(config_for(dir), credentials(), platform, commands, |registry| {
        EventCatalog::new().with("interactionCreate", Arc::new(InteractionDispatcher::new(registry)))
    })
    .unwrap();
    bot.load().await.unwrap();
    bot
}

async fn dispatch(bot: &Bot, interaction: Interaction) -> String {
    let id = interaction.target.id.clone();
    bot.client().emit(Event::InteractionCreate(interaction)).await;
    id
}

fn generic_failure() -> MessagePayload {
    MessagePayload::text(GENERIC_FAILURE).ephemeral()
}

#[tokio::test]
async fn test_unknown_command_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let platform = MemoryPlatform::new();
    let bot = test_bot(dir.path(), platform.clone()).await;

    let interaction = Interaction::command("nope", User::new("1", "u"), platform.clone());
    dispatch(&bot, interaction).await;

    assert!(platform.responses().is_empty());
}

#[tokio::test]
async fn test_non_command_interactions_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "commands/hello.yaml", &command_module("hello", "record"));
    let log = calls();
    let platform = MemoryPlatform::new();
    let bot = test_bot_recording(dir.path(), platform.clone(), log.clone()).await;

    for kind in [InteractionKind::Component, InteractionKind::Autocomplete, InteractionKind::ModalSubmit] {
        let mut interaction = Interaction::command("hello", User::new("1", "u"), platform.clone());
        interaction.kind = kind;
        dispatch(&bot, interaction).await;
    }
    assert!(taken(&log).is_empty());
    assert!(platform.responses().is_empty());

    let interaction = Interaction::command("hello", User::new("1", "u"), platform.clone());
    dispatch(&bot, interaction).await;
    assert_eq!(taken(&log), vec!["record"]);
}

#[tokio::test]
async fn test_panicking_command_gets_generic_reply() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "commands/crash.yaml", &command_module("crash", "panics"));
    write(dir.path(), "commands/crash_late.yaml", &command_module("crash_late", "panics_after_reply"));
    let platform = MemoryPlatform::new();
    let bot = test_bot(dir.path(), platform.clone()).await;

    let id = dispatch(&bot, Interaction::command("crash", User::new("1", "u"), platform.clone())).await;
    assert_eq!(platform.responses_for(&id), vec![ResponseAction::Reply(generic_failure())]);

    let id = dispatch(&bot, Interaction::command("crash_late", User::new("1", "u"), platform.clone())).await;
    assert_eq!(
        platform.responses_for(&id),
        vec![
            ResponseAction::Reply(MessagePayload::text("working on it")),
            ResponseAction::FollowUp(generic_failure()),
        ]
    );
}

#[tokio::test]
async fn test_failure_before_reply_sends_one_generic_reply() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "commands/boom.yaml", &command_module("boom", "fails_immediately"));
    let platform = MemoryPlatform::new();
    let bot = test_bot(dir.path(), platform.clone()).await;

    let interaction = Interaction::command("boom", User::new("1", "u"), platform.clone());
    let id = dispatch(&bot, interaction).await;

    assert_eq!(platform.responses_for(&id), vec![ResponseAction::Reply(generic_failure())]);
}

#[tokio::test]
async fn test_failure_after_reply_sends_follow_up() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "commands/late.yaml", &command_module("late", "fails_after_reply"));
    let platform = MemoryPlatform::new();
    let bot = test_bot(dir.path(), platform.clone()).await;

    let interaction = Interaction::command("late", User::new("1", "u"), platform.clone());
    let id = dispatch(&bot, interaction).await;

    assert_eq!(
        platform.responses_for(&id),
        vec![
            ResponseAction::Reply(MessagePayload::text("working on it")),
            ResponseAction::FollowUp(generic_failure()),
        ]
    );
}

#[tokio::test]
async fn test_failure_after_defer_sends_follow_up() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "commands/slow.yaml", &command_module("slow", "fails_after_defer"));
    let platform = MemoryPlatform::new();
    let bot = test_bot(dir.path(), platform.clone()).await;

    let interaction = Interaction::command("slow", User::new("1", "u"), platform.clone());
    let id = dispatch(&bot, interaction).await;

    assert_eq!(
        platform.responses_for(&id),
        vec![
            ResponseAction::Defer { ephemeral: false },
            ResponseAction::FollowUp(generic_failure()),
        ]
    );
}

#[tokio::test]
async fn test_add_module_replies_with_sum() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "commands/math/add.yaml",
        "definition:\n  name: add\n  description: Adds two numbers together\n  options:\n    - { name: first, description: a, type: number, required: true }\n    - { name: second, description: b, type: number, required: true }\nexecute: add\n",
    );
    write(dir.path(), "events/interactionCreate.yaml", DISPATCH_EVENT);

    let platform = MemoryPlatform::new();
    let bot = Bot::new(config_for(dir.path()), credentials(), platform.clone()).unwrap();
    bot.load().await.unwrap();

    let interaction = Interaction::command("add", User::new("1", "alice"), platform.clone())
        .with_option("first", OptionValue::Integer(2))
        .with_option("second", OptionValue::Integer(3));
    let id = dispatch(&bot, interaction).await;

    let responses = platform.responses_for(&id);
    assert_eq!(responses.len(), 1);
    let ResponseAction::Reply(payload) = &responses[0] else {
        panic!("expected a reply, got {:?}", responses);
    };
    assert!(payload.render_text().contains("2 + 3 = 5"));
    assert_eq!(payload.embeds[0].footer.as_ref().unwrap().text, "Calculated by alice");
}

#[tokio::test]
async fn test_shipped_modules_all_validate() {
    ensure_init();
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("modules");
    let mut config = Config::default();
    config.modules.commands_dir = root.join("commands");
    config.modules.events_dir = root.join("events");

    let bot = Bot::new(config, credentials(), MemoryPlatform::new()).unwrap();
    assert_eq!(bot.load().await.unwrap(), (4, 3));
    assert_eq!(bot.commands().names(), vec!["add", "info", "ping", "whisper"]);
    assert_eq!(bot.events().len(), 3);

    for key in bot.commands().catalog().keys() {
        assert!(bot.commands().has(&key), "no module uses executor {}", key);
    }
}

#[tokio::test]
async fn test_login_pumps_events_until_destroyed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "commands/boom.yaml", &command_module("boom", "fails_immediately"));
    let platform = MemoryPlatform::new();
    let bot = test_bot(dir.path(), platform.clone()).await;

    bot.start().await.unwrap();
    let interaction = Interaction::command("boom", User::new("1", "u"), platform.clone());
    let id = interaction.target.id.clone();
    assert!(platform.push(Event::InteractionCreate(interaction)).await);

    for _ in 0..100 {
        if !platform.responses_for(&id).is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(platform.responses_for(&id), vec![ResponseAction::Reply(generic_failure())]);
    assert_eq!(bot.client().user().unwrap().username, "memory-bot");

    bot.shutdown().await.unwrap();
    bot.client().closed().await;
}

#[test]
fn test_builtin_catalog_keys() {
    assert_eq!(builtins::command_catalog().keys(), vec!["add", "info", "ping", "whisper"]);
}
