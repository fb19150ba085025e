//! Command resolver - turns typed command text into a response.
//!
//! Resolution order: plugins intercepting the `command` event win, then the
//! bot's own meta commands, then the registry. An unknown name is completed
//! silently when a unique prefix match exists, and otherwise answered with
//! "did you mean" suggestions gathered by shortening the typed prefix.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::entities::{CommandEntry, Event};
use crate::domain::traits::Bot;
use crate::plugins::Registry;

use super::dispatcher::Dispatcher;
use super::parser::split_command;

/// Commands answered by the bot core itself. Their registry entries are
/// doc-only placeholders, kept so prefix search and `help` know them.
pub const META_COMMANDS: &[(&str, &str)] =
    &[("help", "Displays help about particular command")];

const MAX_SUGGESTIONS: usize = 5;

pub struct Resolver {
    registry: Arc<Registry>,
    dispatcher: Dispatcher,
    cmd_prefix: String,
}

impl Resolver {
    pub fn new(registry: Arc<Registry>, dispatcher: Dispatcher, cmd_prefix: impl Into<String>) -> Self {
        Self {
            registry,
            dispatcher,
            cmd_prefix: cmd_prefix.into(),
        }
    }

    /// Resolves one line of command text to response lines. `None` means
    /// the line was not actually a command (no token at all).
    pub fn resolve(
        &self,
        bot: &dyn Bot,
        channel: Option<&str>,
        user: &str,
        line: &str,
    ) -> Option<Vec<String>> {
        let (cmd, args) = split_command(line)?;

        // Plugins that intercept commands take priority over the registry.
        let event = Event::Command {
            channel: channel.map(str::to_string),
            user: user.to_string(),
            cmd: cmd.to_string(),
            args: args.map(str::to_string),
        };
        if let Some(replies) = self.dispatcher.notify(bot, &event) {
            return Some(replies);
        }

        if cmd == "help" {
            return Some(vec![self.help(args)]);
        }

        match self.registry.command(cmd) {
            Some(CommandEntry::Handler(command)) => {
                // A handler fault becomes a response line; the bot never
                // crashes on account of a command.
                let response = match command.invoke(args) {
                    Ok(text) => text,
                    Err(e) => e.to_string(),
                };
                Some(vec![response])
            }
            Some(CommandEntry::DocOnly(_)) => Some(vec![format!(
                "Invalid command '{cmd}'; likely indicates faulty plugin"
            )]),
            None => {
                // A unique prefix match is accepted as if fully typed.
                let completions = self.registry.search(cmd);
                if completions.len() == 1 {
                    if let Some(full) = completions.keys().next() {
                        let completed = match args {
                            Some(args) => format!("{full} {args}"),
                            None => full.clone(),
                        };
                        return self.resolve(bot, channel, user, &completed);
                    }
                }
                Some(vec![self.suggestions(cmd)])
            }
        }
    }

    /// Prefixes the first response line with the addressee's nick for
    /// replies said into a shared channel.
    pub fn address(&self, channel: Option<&str>, nick: &str, mut lines: Vec<String>) -> Vec<String> {
        if channel.is_some() {
            if let Some(first) = lines.first_mut() {
                *first = format!("{nick}: {first}");
            }
        }
        lines
    }

    /// The `help` meta command.
    fn help(&self, args: Option<&str>) -> String {
        let name = match args.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return "No help found.".to_string(),
        };
        match self.registry.command_doc(name, &self.cmd_prefix) {
            Some(doc) => format!("{}{} -- {}", self.cmd_prefix, name, doc),
            None => format!("No help found for '{name}'"),
        }
    }

    /// "Did you mean" candidates reachable by shortening the typed prefix.
    fn suggestions(&self, cmd: &str) -> String {
        let mut candidates: BTreeSet<String> = BTreeSet::new();
        let boundaries = cmd
            .char_indices()
            .map(|(i, _)| i)
            .skip(1)
            .chain(std::iter::once(cmd.len()));
        for end in boundaries {
            candidates.extend(self.registry.search(&cmd[..end]).keys().cloned());
        }
        candidates.retain(|name| !name.is_empty());

        if candidates.is_empty() {
            return format!("Unrecognized command '{cmd}'.");
        }

        let total = candidates.len();
        let shown: Vec<String> = candidates
            .iter()
            .take(MAX_SUGGESTIONS)
            .map(|name| format!("{}{}", self.cmd_prefix, name))
            .collect();

        if total == 1 {
            format!("Did you mean {} ?", shown[0])
        } else {
            let mut listed = shown.join(" ");
            if total > MAX_SUGGESTIONS {
                listed.push_str(&format!(" ... ({} more)", total - MAX_SUGGESTIONS));
            }
            format!("Did you mean one of: {listed} ?")
        }
    }
}
