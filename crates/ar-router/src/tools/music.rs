//! play_music: a song by title, or a genre.

use std::sync::LazyLock;

use ar_protocol::{ArgMap, ArgSpec, ToolSpec, ValueHint};
use regex::Regex;
use serde_json::json;

use super::{Tool, compile};
use crate::coerce::clean_text;

static TRIGGERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\bplay\b",
        r"\blisten\s+to\b",
        r"\bput\s+on\b",
        r"\bmusic\b",
        r"\bsongs?\b",
    ])
});

static GENRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:play|put\s+on|listen\s+to)\s+(?:me\s+)?(?:some\s+)?([\w&' -]+?)\s+music\b")
        .unwrap()
});

static SONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:play|put\s+on|listen\s+to)\s+(?:me\s+)?(?:the\s+song\s+|some\s+)?(.+?)(?:\s+(?:on\s+repeat|please))?[.!?]*$",
    )
    .unwrap()
});

const VAGUE: &[&str] = &["music", "something", "a song", "songs", "anything"];

pub struct PlayMusic;

impl Tool for PlayMusic {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("play_music", "Play a song or a genre of music")
            .with_arg(ArgSpec::string("song", "Song or artist name").hint(ValueHint::MediaTitle))
            .with_arg(ArgSpec::string("genre", "Music genre"))
            .require_one_of(&["song", "genre"])
    }

    fn triggers(&self) -> &[Regex] {
        &TRIGGERS
    }

    fn cues(&self) -> &'static [&'static str] {
        &["play", "put on", "listen to"]
    }

    fn extract(&self, text: &str) -> ArgMap {
        let mut args = ArgMap::new();
        if let Some(caps) = GENRE.captures(text) {
            let genre = clean_text(&caps[1]).to_lowercase();
            if !genre.is_empty() {
                args.insert("genre".into(), json!(genre));
            }
            return args;
        }
        if let Some(caps) = SONG.captures(text) {
            let song = clean_text(&caps[1]);
            if !song.is_empty() && !VAGUE.contains(&song.to_lowercase().as_str()) {
                args.insert("song".into(), json!(song));
            }
        }
        args
    }
}
