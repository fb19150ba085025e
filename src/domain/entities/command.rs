//! Command entries stored in the extension registry.

use crate::application::errors::CommandError;

/// Command handler function type. The single argument is the trailing
/// argument string of the invocation, absent when the command was issued
/// bare.
pub type CommandFn = Box<dyn Fn(Option<&str>) -> Result<String, CommandError> + Send + Sync>;

/// A directly invokable command: a handler plus its help text.
pub struct Command {
    pub name: String,
    pub doc: Option<String>,
    handler: CommandFn,
}

impl Command {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Option<&str>) -> Result<String, CommandError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            doc: None,
            handler: Box::new(handler),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn invoke(&self, args: Option<&str>) -> Result<String, CommandError> {
        (self.handler)(args)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .finish_non_exhaustive()
    }
}

/// What a command name resolves to in the registry.
///
/// Plugin-declared commands land as `DocOnly` placeholders: the plugin
/// answers them by intercepting the `command` event, so all the registry
/// keeps is their help text.
#[derive(Debug)]
pub enum CommandEntry {
    Handler(Command),
    DocOnly(String),
}

impl CommandEntry {
    /// Raw help text of the entry, before `#cmd#` substitution.
    pub fn doc(&self) -> Option<&str> {
        match self {
            CommandEntry::Handler(cmd) => cmd.doc.as_deref(),
            CommandEntry::DocOnly(doc) => Some(doc.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_invocation_passes_args_through() {
        let cmd = Command::new("echo", |args| {
            Ok(args.unwrap_or("<nothing>").to_string())
        });
        assert_eq!(cmd.invoke(Some("hello")).unwrap(), "hello");
        assert_eq!(cmd.invoke(None).unwrap(), "<nothing>");
    }

    #[test]
    fn entry_doc_covers_both_variants() {
        let handler = CommandEntry::Handler(
            Command::new("c", |_| Ok(String::new())).with_doc("Evaluates #cmd#"),
        );
        assert_eq!(handler.doc(), Some("Evaluates #cmd#"));

        let placeholder = CommandEntry::DocOnly("Reports last time".into());
        assert_eq!(placeholder.doc(), Some("Reports last time"));
    }
}
