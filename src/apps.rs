//! Static phone app catalog
//!
//! The interpreter knows exactly eight apps. The catalog is immutable and
//! ordered; the UI renders it as the home-screen grid in this order.

/// A launchable phone app with its home-screen presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct App {
    /// Display name ("Phone", "Messages", ...)
    pub name: &'static str,
    /// Icon glyph shown on the home screen
    pub icon: &'static str,
    /// Tile background color (hex)
    pub color: &'static str,
}

/// The full catalog, in home-screen order
pub const CATALOG: [App; 8] = [
    App { name: "Phone", icon: "📞", color: "#34C759" },
    App { name: "Messages", icon: "💬", color: "#007AFF" },
    App { name: "Camera", icon: "📷", color: "#5856D6" },
    App { name: "Photos", icon: "🖼️", color: "#FF9500" },
    App { name: "Music", icon: "🎵", color: "#FF2D55" },
    App { name: "Settings", icon: "⚙️", color: "#8E8E93" },
    App { name: "Maps", icon: "🗺️", color: "#30D158" },
    App { name: "Calendar", icon: "📅", color: "#FF3B30" },
];

/// Apps the interpreter activates directly (call, message, photo, music)
pub const PHONE: &App = &CATALOG[0];
pub const MESSAGES: &App = &CATALOG[1];
pub const CAMERA: &App = &CATALOG[2];
pub const MUSIC: &App = &CATALOG[4];

/// Look up an app by name, case-insensitively
pub fn by_name(name: &str) -> Option<&'static App> {
    CATALOG.iter().find(|app| app.name.eq_ignore_ascii_case(name))
}

/// Scan an utterance for the first catalog app whose lowercase name
/// appears as a substring. Catalog order breaks ties.
pub fn find_in_utterance(utterance: &str) -> Option<&'static App> {
    CATALOG
        .iter()
        .find(|app| utterance.contains(app.name.to_ascii_lowercase().as_str()))
}

impl std::fmt::Display for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
