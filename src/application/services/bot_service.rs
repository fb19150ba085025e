//! The bot core: registry, dispatcher and resolver wired together.

use std::sync::{Arc, Mutex};

use tracing::{error, info};

use crate::application::errors::CommandError;
use crate::application::messaging::resolver::META_COMMANDS;
use crate::application::messaging::{command_body, Dispatcher, Resolver};
use crate::domain::entities::user::nick_or_mask;
use crate::domain::entities::{Command, CommandEntry, Event, MessageKind};
use crate::domain::traits::Bot;
use crate::infrastructure::sandbox::Evaluator;
use crate::plugins::Registry;

/// Longest line the bot will say in one message.
const MESSAGE_MAX_LEN: usize = 768;

/// Owns the frozen registry and drives event handling.
///
/// The registry is mutated only while the service is being assembled;
/// freezing it into an `Arc` at construction is what makes the later
/// read-only sharing between dispatcher and resolver safe.
pub struct BotService {
    dispatcher: Dispatcher,
    resolver: Resolver,
    cmd_prefix: String,
}

impl BotService {
    pub fn new(mut registry: Registry, cmd_prefix: impl Into<String>) -> Self {
        let cmd_prefix = cmd_prefix.into();
        for (name, doc) in META_COMMANDS.iter().copied() {
            registry.register_command(name, CommandEntry::DocOnly(doc.to_string()));
        }

        let registry = Arc::new(registry);
        let dispatcher = Dispatcher::new(registry.clone());
        let resolver = Resolver::new(registry, dispatcher.clone(), cmd_prefix.clone());
        info!("Bot core assembled");

        Self {
            dispatcher,
            resolver,
            cmd_prefix,
        }
    }

    /// Registers the built-in commands: the sandboxed calculator and the
    /// version report.
    pub fn register_defaults(registry: &mut Registry, evaluator: Arc<Mutex<Evaluator>>) {
        registry.register_handler(
            Command::new("c", move |args| {
                let expression = match args {
                    Some(expression) if !expression.trim().is_empty() => expression,
                    _ => return Ok("No expression supplied.".to_string()),
                };
                let mut evaluator = evaluator
                    .lock()
                    .map_err(|_| CommandError::ExecutionFailed("evaluator unavailable".into()))?;
                Ok(evaluator.evaluate(expression))
            })
            .with_doc("Evaluates given expression, e.g.: #cmd# 2 + 2"),
        );

        registry.register_handler(
            Command::new("version", |_| {
                Ok(format!("parley-bot v{}", env!("CARGO_PKG_VERSION")))
            })
            .with_doc("Shows the bot version"),
        );
    }

    /// Handles one inbound protocol event: every plugin hears it, and a
    /// chat message that qualifies as a command goes through the resolver,
    /// with the response said back through the bot.
    pub fn handle_event(&self, bot: &dyn Bot, event: &Event) {
        self.dispatcher.notify(bot, event);

        let Event::Message {
            channel,
            user,
            text,
            kind: MessageKind::Say,
        } = event
        else {
            return;
        };

        let in_channel = channel.is_some();
        let Some(body) = command_body(text, &self.cmd_prefix, in_channel) else {
            return;
        };
        let Some(lines) = self.resolver.resolve(bot, channel.as_deref(), user, body) else {
            return;
        };

        let nick = nick_or_mask(user);
        let lines = self.resolver.address(channel.as_deref(), nick, lines);
        let target = channel.clone().unwrap_or_else(|| nick.to_string());
        self.say(bot, &target, &lines);
    }

    /// Direct access to the resolver, mainly for tests and embedding.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    fn say(&self, bot: &dyn Bot, target: &str, lines: &[String]) {
        for line in lines {
            if let Err(e) = bot.send_message(target, clip(line, MESSAGE_MAX_LEN)) {
                error!("Failed to send message to {}: {}", target, e);
            }
        }
    }
}

/// Trims a line to at most `max` bytes on a character boundary.
fn clip(line: &str, max: usize) -> &str {
    if line.len() <= max {
        return line;
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}
