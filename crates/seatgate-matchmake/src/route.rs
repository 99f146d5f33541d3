//! Path parsing for the matchmake routes.
//!
//! A path is read as the sequence of its runs of allowed characters, so
//! `/matchmake/joinOrCreate/chat` is `["matchmake", "joinOrCreate", "chat"]`.

use regex::Regex;
use seatgate_protocol::ServerError;

/// Room-name filter for a `GET` listing.
///
/// The last segment when the path has more than one, otherwise `""`
/// (list all rooms).
pub fn parse_list_filter(path: &str, allowed: &Regex) -> String {
    let mut segments = allowed.find_iter(path);
    if segments.next().is_none() {
        return String::new();
    }
    segments
        .last()
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// A matchmaking call parsed from a `POST` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Segment right after the matchmake route, e.g. `joinOrCreate`.
    pub method: String,
    /// Segment after the method; `""` when absent.
    pub room_name: String,
}

impl Invocation {
    /// Parses `/<matchmake_route>/<method>[/<room_name>]` out of `path`.
    ///
    /// # Errors
    /// [`ServerError::InvalidRoute`] if the route segment or the method
    /// segment after it is missing.
    pub fn parse(
        path: &str,
        matchmake_route: &str,
        allowed: &Regex,
    ) -> Result<Self, ServerError> {
        let mut segments = allowed.find_iter(path).map(|m| m.as_str());

        segments
            .by_ref()
            .find(|segment| *segment == matchmake_route)
            .ok_or(ServerError::InvalidRoute)?;
        let method = segments.next().ok_or(ServerError::InvalidRoute)?;
        let room_name = segments.next().unwrap_or_default();

        Ok(Self {
            method: method.to_string(),
            room_name: room_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ALLOWED_ROOM_NAME_CHARS;

    fn filter(path: &str) -> String {
        parse_list_filter(path, &ALLOWED_ROOM_NAME_CHARS)
    }

    fn invocation(path: &str) -> Result<Invocation, ServerError> {
        Invocation::parse(path, "match", &ALLOWED_ROOM_NAME_CHARS)
    }

    #[test]
    fn test_parse_list_filter_route_only_is_empty() {
        assert_eq!(filter("/match/"), "");
        assert_eq!(filter("/match"), "");
    }

    #[test]
    fn test_parse_list_filter_takes_last_segment() {
        assert_eq!(filter("/match/chat"), "chat");
        assert_eq!(filter("/match/battle/arena_2"), "arena_2");
    }

    #[test]
    fn test_parse_list_filter_skips_disallowed_characters() {
        assert_eq!(filter("/match/my.room"), "room");
    }

    #[test]
    fn test_parse_list_filter_empty_path_is_empty() {
        assert_eq!(filter("/"), "");
        assert_eq!(filter(""), "");
    }

    #[test]
    fn test_invocation_parse_method_and_room() {
        let parsed = invocation("/match/join/room1").unwrap();

        assert_eq!(parsed.method, "join");
        assert_eq!(parsed.room_name, "room1");
    }

    #[test]
    fn test_invocation_parse_missing_room_is_empty() {
        let parsed = invocation("/match/reconnect").unwrap();

        assert_eq!(parsed.method, "reconnect");
        assert_eq!(parsed.room_name, "");
    }

    #[test]
    fn test_invocation_parse_with_prefix_before_route() {
        let parsed = invocation("/api/v1/match/create/lobby").unwrap();

        assert_eq!(parsed.method, "create");
        assert_eq!(parsed.room_name, "lobby");
    }

    #[test]
    fn test_invocation_parse_missing_method_is_invalid_route() {
        assert_eq!(invocation("/match/"), Err(ServerError::InvalidRoute));
    }

    #[test]
    fn test_invocation_parse_missing_route_is_invalid_route() {
        assert_eq!(invocation("/other/join/room1"), Err(ServerError::InvalidRoute));
    }
}
