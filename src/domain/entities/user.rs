//! User mask parsing.
//!
//! Protocol events identify users by the full `nick!id@host` mask; plugins
//! and the resolver mostly care about the nick part.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static USER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<nick>[^!]+)(?:!(?P<id>[^@]*)@(?P<host>.*))?$").expect("user mask regex")
});

fn mask_part(mask: &str, part: &str) -> Option<String> {
    USER_RE
        .captures(mask)
        .and_then(|caps| caps.name(part).map(|m| m.as_str().to_string()))
}

/// The nick of a `nick!id@host` mask. A bare nick is returned unchanged.
pub fn get_nick(mask: &str) -> Option<String> {
    mask_part(mask, "nick")
}

pub fn get_user_id(mask: &str) -> Option<String> {
    mask_part(mask, "id")
}

pub fn get_host(mask: &str) -> Option<String> {
    mask_part(mask, "host")
}

/// The nick of a mask, falling back to the mask itself when it does not
/// parse (e.g. a server name).
pub fn nick_or_mask(mask: &str) -> &str {
    match USER_RE.captures(mask).and_then(|caps| caps.name("nick")) {
        Some(m) => &mask[m.range()],
        None => mask,
    }
}
