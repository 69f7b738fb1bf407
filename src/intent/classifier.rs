//! Ordered-rule intent classifier
//!
//! Classification is substring matching over an explicitly ordered rule
//! list, first match wins. The order is load-bearing: overlapping keywords
//! ("call and text sarah" contains both a call and a message trigger) are
//! tie-broken by rule position, so the rules must stay in this sequence.

use std::sync::LazyLock;

use regex::Regex;

use crate::apps::{self, App};

/// The fixed set of command intents. Exactly one is assigned per utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    OpenApp,
    Call,
    SendMessage,
    TakePhoto,
    PlayMusic,
    BrightnessUp,
    BrightnessDown,
    VolumeUp,
    VolumeDown,
    TimeQuery,
    BatteryQuery,
    WifiQuery,
    Greeting,
    Unknown,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Intent::OpenApp => "OpenApp",
            Intent::Call => "Call",
            Intent::SendMessage => "SendMessage",
            Intent::TakePhoto => "TakePhoto",
            Intent::PlayMusic => "PlayMusic",
            Intent::BrightnessUp => "BrightnessUp",
            Intent::BrightnessDown => "BrightnessDown",
            Intent::VolumeUp => "VolumeUp",
            Intent::VolumeDown => "VolumeDown",
            Intent::TimeQuery => "TimeQuery",
            Intent::BatteryQuery => "BatteryQuery",
            Intent::WifiQuery => "WifiQuery",
            Intent::Greeting => "Greeting",
            Intent::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

/// Parameters extracted during classification, scoped to one command cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    /// Resolved target app for OpenApp. None means the utterance named no
    /// known app and the interpreter should ask for clarification.
    pub app: Option<&'static App>,
    /// Contact name for Call / SendMessage
    pub contact: Option<String>,
    /// Song title for PlayMusic
    pub song: Option<String>,
}

static CALL_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"call\s+(\w+)").unwrap());
static MESSAGE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:to|message)\s+(\w+)").unwrap());
// Word-bounded so "display" does not trigger playback
static PLAY_TRIGGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bplay\b").unwrap());
static PLAY_SONG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bplay\s+(.+)").unwrap());

fn first_capture(re: &Regex, utterance: &str) -> Option<String> {
    re.captures(utterance)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Classify a lowercase utterance into exactly one intent plus parameters.
///
/// Pure function of the utterance and the static app catalog. Extraction
/// failure is not an error: missing names fall back to "contact", a missing
/// song title to "music", and an unresolved app to `Params::app = None`.
pub fn classify(utterance: &str) -> (Intent, Params) {
    if utterance.contains("open") || utterance.contains("launch") {
        let params = Params {
            app: apps::find_in_utterance(utterance),
            ..Params::default()
        };
        return (Intent::OpenApp, params);
    }

    if utterance.contains("call") {
        let contact = first_capture(&CALL_NAME, utterance)
            .unwrap_or_else(|| "contact".to_string());
        return (
            Intent::Call,
            Params { contact: Some(contact), ..Params::default() },
        );
    }

    if utterance.contains("send message") || utterance.contains("text") {
        let contact = first_capture(&MESSAGE_NAME, utterance)
            .unwrap_or_else(|| "contact".to_string());
        return (
            Intent::SendMessage,
            Params { contact: Some(contact), ..Params::default() },
        );
    }

    if utterance.contains("take picture") || utterance.contains("take photo") {
        return (Intent::TakePhoto, Params::default());
    }

    if PLAY_TRIGGER.is_match(utterance) {
        let song = first_capture(&PLAY_SONG, utterance)
            .unwrap_or_else(|| "music".to_string());
        return (
            Intent::PlayMusic,
            Params { song: Some(song), ..Params::default() },
        );
    }

    if utterance.contains("increase brightness") || utterance.contains("brightness up") {
        return (Intent::BrightnessUp, Params::default());
    }

    if utterance.contains("decrease brightness") || utterance.contains("brightness down") {
        return (Intent::BrightnessDown, Params::default());
    }

    if utterance.contains("volume up") || utterance.contains("increase volume") {
        return (Intent::VolumeUp, Params::default());
    }

    if utterance.contains("volume down") || utterance.contains("decrease volume") {
        return (Intent::VolumeDown, Params::default());
    }

    if utterance.contains("what time") || utterance.contains("time is it") {
        return (Intent::TimeQuery, Params::default());
    }

    if utterance.contains("battery") || utterance.contains("charge") {
        return (Intent::BatteryQuery, Params::default());
    }

    if utterance.contains("wifi") || utterance.contains("wi-fi") {
        return (Intent::WifiQuery, Params::default());
    }

    if utterance.contains("hello") || utterance.contains("hi jarvis") {
        return (Intent::Greeting, Params::default());
    }

    (Intent::Unknown, Params::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_app_resolved() {
        let (intent, params) = classify("open camera");
        assert_eq!(intent, Intent::OpenApp);
        assert_eq!(params.app.unwrap().name, "Camera");
    }

    #[test]
    fn test_open_app_unresolved() {
        let (intent, params) = classify("open the pod bay doors");
        assert_eq!(intent, Intent::OpenApp);
        assert!(params.app.is_none());
    }

    #[test]
    fn test_launch_keyword() {
        let (intent, params) = classify("launch settings");
        assert_eq!(intent, Intent::OpenApp);
        assert_eq!(params.app.unwrap().name, "Settings");
    }

    #[test]
    fn test_call_extracts_name() {
        let (intent, params) = classify("call sarah please");
        assert_eq!(intent, Intent::Call);
        assert_eq!(params.contact.as_deref(), Some("sarah"));
    }

    #[test]
    fn test_call_defaults_contact() {
        let (intent, params) = classify("call");
        assert_eq!(intent, Intent::Call);
        assert_eq!(params.contact.as_deref(), Some("contact"));
    }

    #[test]
    fn test_call_precedes_send_message() {
        // Rule 2 (call) fires before rule 3 (text), and the name comes
        // from the call pattern, not the message pattern.
        let (intent, params) = classify("call and text sarah");
        assert_eq!(intent, Intent::Call);
        assert_eq!(params.contact.as_deref(), Some("and"));
    }

    #[test]
    fn test_send_text_to_name() {
        let (intent, params) = classify("send a text to sarah");
        assert_eq!(intent, Intent::SendMessage);
        assert_eq!(params.contact.as_deref(), Some("sarah"));
    }

    #[test]
    fn test_send_message_leftmost_match() {
        // The leftmost alternation match is "message to", so the captured
        // token is "to", not the name that follows it.
        let (intent, params) = classify("send message to sarah");
        assert_eq!(intent, Intent::SendMessage);
        assert_eq!(params.contact.as_deref(), Some("to"));
    }

    #[test]
    fn test_text_keyword() {
        let (intent, params) = classify("text john");
        assert_eq!(intent, Intent::SendMessage);
        // "text john" matches neither "to <word>" nor "message <word>"
        assert_eq!(params.contact.as_deref(), Some("contact"));
    }

    #[test]
    fn test_take_photo() {
        assert_eq!(classify("take photo").0, Intent::TakePhoto);
        assert_eq!(classify("take picture of this").0, Intent::TakePhoto);
    }

    #[test]
    fn test_play_music_extracts_song() {
        let (intent, params) = classify("play music bohemian rhapsody");
        assert_eq!(intent, Intent::PlayMusic);
        assert_eq!(params.song.as_deref(), Some("music bohemian rhapsody"));
    }

    #[test]
    fn test_play_song_defaults() {
        let (intent, params) = classify("play song");
        assert_eq!(intent, Intent::PlayMusic);
        assert_eq!(params.song.as_deref(), Some("song"));
    }

    #[test]
    fn test_play_bare_title_round_trip() {
        let (intent, params) = classify("play bohemian rhapsody");
        assert_eq!(intent, Intent::PlayMusic);
        assert_eq!(params.song.as_deref(), Some("bohemian rhapsody"));
    }

    #[test]
    fn test_play_without_title_defaults() {
        let (intent, params) = classify("play");
        assert_eq!(intent, Intent::PlayMusic);
        assert_eq!(params.song.as_deref(), Some("music"));
    }

    #[test]
    fn test_display_does_not_trigger_playback() {
        assert_eq!(classify("display something").0, Intent::Unknown);
    }

    #[test]
    fn test_brightness_and_volume_rules() {
        assert_eq!(classify("increase brightness").0, Intent::BrightnessUp);
        assert_eq!(classify("brightness up a bit").0, Intent::BrightnessUp);
        assert_eq!(classify("decrease brightness").0, Intent::BrightnessDown);
        assert_eq!(classify("brightness down").0, Intent::BrightnessDown);
        assert_eq!(classify("volume up").0, Intent::VolumeUp);
        assert_eq!(classify("increase volume").0, Intent::VolumeUp);
        assert_eq!(classify("volume down").0, Intent::VolumeDown);
        assert_eq!(classify("decrease volume").0, Intent::VolumeDown);
    }

    #[test]
    fn test_queries_and_greeting() {
        assert_eq!(classify("what time is it").0, Intent::TimeQuery);
        assert_eq!(classify("how much battery is left").0, Intent::BatteryQuery);
        assert_eq!(classify("is the charge full").0, Intent::BatteryQuery);
        assert_eq!(classify("is wifi on").0, Intent::WifiQuery);
        assert_eq!(classify("is wi-fi connected").0, Intent::WifiQuery);
        assert_eq!(classify("hello there").0, Intent::Greeting);
        assert_eq!(classify("hi jarvis").0, Intent::Greeting);
    }

    #[test]
    fn test_unknown_fallback() {
        let (intent, params) = classify("make me a sandwich");
        assert_eq!(intent, Intent::Unknown);
        assert_eq!(params, Params::default());
    }
}
