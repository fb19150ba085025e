//! Splitting chat lines into command invocations.

/// Splits a line into `(cmd, args)`: the first whitespace-delimited token
/// and the remainder. Returns `None` for input with no token at all.
pub fn split_command(line: &str) -> Option<(&str, Option<&str>)> {
    let line = line.trim_start();
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => {
            let rest = rest.trim_start();
            let args = if rest.is_empty() { None } else { Some(rest) };
            Some((cmd, args))
        }
        None => Some((line, None)),
    }
}

/// Decides whether a chat line is a command invocation, returning the line
/// with the command prefix stripped.
///
/// In a channel a line is a command only when it starts with the configured
/// prefix (everything is a command when no prefix is configured). In
/// private everything is a command, with a leading prefix stripped if
/// present anyway.
pub fn command_body<'a>(text: &'a str, prefix: &str, in_channel: bool) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(text);
    }
    match text.strip_prefix(prefix) {
        Some(body) => Some(body),
        None if in_channel => None,
        None => Some(text),
    }
}
