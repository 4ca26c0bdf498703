//! # Stream Identifiers
//!
//! Parses the two stream-id grammars an ingest or playback connection may
//! present: the legacy slash-separated form and the newer key-value form.
//! Grounded on `examples/original_source/stream/streamid.go` for the legacy
//! grammar (including the empty-name-segment rejection in
//! `streamid_test.go`'s `InvalidName` case) and on `examples/original_source/srt/server.go`'s
//! `GetStatistics` (which builds `srt://...?streamid=#!::m=request,r=...`
//! URLs) for the key-value grammar.

use crate::error::{RelayError, Result};

/// Whether a stream id requests playback or publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Subscribe to an existing stream.
    Play,
    /// Publish a new stream.
    Publish,
}

impl Mode {
    /// The `call` value an HTTP auth backend expects, matching the
    /// nginx-rtmp `on_play`/`on_publish` directive convention.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Play => "play",
            Mode::Publish => "publish",
        }
    }
}

/// A parsed stream identifier.
///
/// Carries the original string alongside the extracted fields so that
/// `matches` can run a wildcard match against exactly what the peer sent,
/// regardless of which grammar it used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamId {
    original: String,
    mode: Mode,
    name: String,
    password: String,
    username: String,
}

impl StreamId {
    /// Parses a stream id string using either the legacy or key-value grammar.
    pub fn parse(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix("#!::") {
            Self::parse_key_value(s, rest)
        } else {
            Self::parse_legacy(s)
        }
    }

    fn parse_legacy(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(RelayError::InvalidStreamId);
        }
        let mode = parse_mode(parts[0])?;
        let name = parts[1];
        if name.is_empty() {
            return Err(RelayError::MissingName);
        }
        let password = parts.get(2).copied().unwrap_or("");
        Ok(StreamId {
            original: s.to_string(),
            mode,
            name: name.to_string(),
            password: password.to_string(),
            username: String::new(),
        })
    }

    fn parse_key_value(original: &str, rest: &str) -> Result<Self> {
        let mut mode = None;
        let mut name = String::new();
        let mut password = String::new();
        let mut username = String::new();

        for pair in rest.split(',') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .split_once('=')
                .ok_or(RelayError::InvalidStreamId)?;
            match key {
                "m" => mode = Some(parse_mode_keyword(value)?),
                "r" => name = value.to_string(),
                "s" => password = value.to_string(),
                "u" => username = value.to_string(),
                "h" | "t" | "bmd_uuid" | "bmd_name" => {}
                other => return Err(RelayError::UnsupportedKey(other.to_string())),
            }
        }

        let mode = mode.ok_or(RelayError::InvalidMode)?;
        if name.is_empty() {
            return Err(RelayError::MissingName);
        }

        Ok(StreamId {
            original: original.to_string(),
            mode,
            name,
            password,
            username,
        })
    }

    /// The stream name, used as the relay registry key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The requested mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The password field, empty if none was supplied.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// The username field, empty unless the key-value grammar supplied one.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The exact string this id was parsed from.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Matches this id's original string against a glob pattern, where `*`
    /// matches any run of characters including none.
    pub fn matches(&self, pattern: &str) -> bool {
        glob_match(pattern, &self.original)
    }
}

fn parse_mode(s: &str) -> Result<Mode> {
    match s {
        "play" => Ok(Mode::Play),
        "publish" => Ok(Mode::Publish),
        _ => Err(RelayError::InvalidMode),
    }
}

fn parse_mode_keyword(s: &str) -> Result<Mode> {
    match s {
        "request" => Ok(Mode::Play),
        "publish" => Ok(Mode::Publish),
        _ => Err(RelayError::InvalidMode),
    }
}

/// Matches `text` against a glob `pattern` where `*` stands for any run of
/// characters, including the empty run. The match is anchored at both ends.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let (mut star, mut match_from) = (None, 0usize);

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '*') {
            star = Some(pi);
            match_from = ti;
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            match_from += 1;
            ti = match_from;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }

    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_two_part() {
        let id = StreamId::parse("publish/foo").unwrap();
        assert_eq!(id.mode(), Mode::Publish);
        assert_eq!(id.name(), "foo");
        assert_eq!(id.password(), "");
    }

    #[test]
    fn parses_legacy_three_part() {
        let id = StreamId::parse("play/foo/secret").unwrap();
        assert_eq!(id.mode(), Mode::Play);
        assert_eq!(id.name(), "foo");
        assert_eq!(id.password(), "secret");
    }

    #[test]
    fn rejects_empty_legacy_name() {
        let err = StreamId::parse("play//s1").unwrap_err();
        assert!(matches!(err, RelayError::MissingName));
    }

    #[test]
    fn rejects_unknown_legacy_mode() {
        let err = StreamId::parse("delete/foo").unwrap_err();
        assert!(matches!(err, RelayError::InvalidMode));
    }

    #[test]
    fn rejects_wrong_legacy_segment_count() {
        assert!(StreamId::parse("play").is_err());
        assert!(StreamId::parse("play/foo/bar/baz").is_err());
    }

    #[test]
    fn parses_key_value_form() {
        let id = StreamId::parse("#!::m=publish,r=foo,s=secret,u=alice").unwrap();
        assert_eq!(id.mode(), Mode::Publish);
        assert_eq!(id.name(), "foo");
        assert_eq!(id.password(), "secret");
        assert_eq!(id.username(), "alice");
    }

    #[test]
    fn key_value_request_mode_maps_to_play() {
        let id = StreamId::parse("#!::m=request,r=foo").unwrap();
        assert_eq!(id.mode(), Mode::Play);
    }

    #[test]
    fn key_value_ignores_known_extra_keys() {
        let id = StreamId::parse("#!::m=request,r=foo,h=example.com,t=123,bmd_uuid=x,bmd_name=y")
            .unwrap();
        assert_eq!(id.name(), "foo");
    }

    #[test]
    fn key_value_rejects_unknown_key() {
        let err = StreamId::parse("#!::m=request,r=foo,zz=1").unwrap_err();
        assert!(matches!(err, RelayError::UnsupportedKey(k) if k == "zz"));
    }

    #[test]
    fn key_value_requires_name() {
        let err = StreamId::parse("#!::m=request").unwrap_err();
        assert!(matches!(err, RelayError::MissingName));
    }

    #[test]
    fn round_trips_through_reparsing() {
        let original = "play/foo/secret";
        let first = StreamId::parse(original).unwrap();
        let second = StreamId::parse(first.as_str()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn wildcard_matches_any_run_including_empty() {
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("play/*", "play/foo"));
        assert!(glob_match("play/*/secret", "play/foo/secret"));
        assert!(!glob_match("play/*/secret", "play/foo/other"));
        assert!(glob_match("publish/*", "publish/"));
    }

    #[test]
    fn stream_id_matches_uses_original_string() {
        let id = StreamId::parse("play/foo/secret").unwrap();
        assert!(id.matches("play/*"));
        assert!(!id.matches("publish/*"));
    }
}
