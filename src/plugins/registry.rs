//! The extension registry - commands and plugins known to the bot.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::{error, info};

use crate::domain::entities::{Command, CommandEntry};
use crate::domain::prefix_tree::PrefixTree;
use crate::plugins::trait_def::Plugin;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Collapses whitespace runs into single spaces.
fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").into_owned()
}

/// Holds every command and plugin registered with the bot.
///
/// Built during startup, then treated as read-only for the rest of the
/// process: dispatch never mutates it, so a frozen `Arc<Registry>` is
/// shared freely between the dispatcher and the resolver.
#[derive(Default)]
pub struct Registry {
    commands: PrefixTree<CommandEntry>,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command. Empty and duplicate names are rejected and
    /// logged; an existing entry is never overwritten.
    pub fn register_command(&mut self, name: &str, entry: CommandEntry) -> bool {
        if name.is_empty() {
            error!("Command name must not be empty");
            return false;
        }
        if self.commands.contains(name) {
            error!("Duplicate or reserved command name \"{}\"", name);
            return false;
        }
        self.commands.add(name, entry)
    }

    /// Registers a command handler, returning it for builder-style use.
    pub fn register_handler(&mut self, command: Command) -> bool {
        let name = command.name.clone();
        self.register_command(&name, CommandEntry::Handler(command))
    }

    /// Registers a plugin, pre-registering its declared commands as
    /// doc-only placeholders. Plugins are notified in registration order.
    pub fn register_plugin(&mut self, plugin: Arc<dyn Plugin>) {
        for (name, doc) in plugin.commands() {
            self.register_command(name, CommandEntry::DocOnly(doc.to_string()));
        }
        info!("Registered plugin: {}", plugin.name());
        self.plugins.push(plugin);
    }

    /// Exact-name command lookup.
    pub fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(name)
    }

    /// Every registered command name starting with `prefix`.
    pub fn search(&self, prefix: &str) -> BTreeMap<String, &CommandEntry> {
        self.commands.search(prefix)
    }

    /// Help text for a command, with the `#cmd#` placeholder replaced by
    /// the fully-prefixed invocation and whitespace normalized. A handler
    /// registered without help text still gets a stock description.
    pub fn command_doc(&self, name: &str, cmd_prefix: &str) -> Option<String> {
        let doc = self
            .command(name)?
            .doc()
            .unwrap_or("<no description available>");
        let doc = doc.replace("#cmd#", &format!("{cmd_prefix}{name}"));
        Some(normalize_whitespace(doc.trim()))
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }
}
