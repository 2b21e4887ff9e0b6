//! Predefined banner styles

use crate::ui::Tone;

/// A banner preset: ASCII art plus coloured subtitle lines
#[derive(Debug)]
pub struct Style {
    pub name: &'static str,
    pub display_name: &'static str,
    pub ascii_art: &'static str,
    pub subtitle: &'static [(&'static str, Tone)],
}

const DEFAULT_ART: &str = "\
██████╗ ███████╗███████╗██████╗  ██████╗ ██╗  ██╗███████╗███╗   ██╗
██╔══██╗██╔════╝██╔════╝██╔══██╗██╔═══██╗██║ ██╔╝██╔════╝████╗  ██║
██████╔╝█████╗  ███████╗██████╔╝██║   ██║█████╔╝ █████╗  ██╔██╗ ██║
██╔══██╗██╔══╝  ╚════██║██╔═══╝ ██║   ██║██╔═██╗ ██╔══╝  ██║╚██╗██║
██████╔╝███████╗███████║██║     ╚██████╔╝██║  ██╗███████╗██║ ╚████║
╚═════╝ ╚══════╝╚══════╝╚═╝      ╚═════╝ ╚═╝  ╚═╝╚══════╝╚═╝  ╚═══╝";

const HACKER_ART: &str = "\
╔╗ ╔═╗╔═╗╔═╗╔═╗╦╔═╔═╗╔╗╔
╠╩╗║╣ ╚═╗╠═╝║ ║╠╩╗║╣ ║║║
╚═╝╚═╝╚═╝╩  ╚═╝╩ ╩╚═╝╝╚╝";

const FUN_ART: &str = "\
┌─┐┬ ┬┌─┐┌┬┐  ┌┬┐┬┌┬┐┌─┐
│  ├─┤├─┤ │    │ ││││├┤
└─┘┴ ┴┴ ┴ ┴    ┴ ┴┴ ┴└─┘";

pub static STYLES: &[Style] = &[
    Style {
        name: "default",
        display_name: "Default",
        ascii_art: DEFAULT_ART,
        subtitle: &[
            (
                "A terminal chat experience that you can configure yourself.",
                Tone::Dim,
            ),
            ("Type 'quit' to exit.", Tone::Cyan),
        ],
    },
    Style {
        name: "minimal",
        display_name: "Minimal",
        ascii_art: "bespoken",
        subtitle: &[("chat assistant", Tone::Dim)],
    },
    Style {
        name: "hacker",
        display_name: "Hacker",
        ascii_art: HACKER_ART,
        subtitle: &[
            ("> system ready", Tone::Green),
            ("> type 'quit' to terminate", Tone::Green),
        ],
    },
    Style {
        name: "professional",
        display_name: "Professional",
        ascii_art: "BESPOKEN\nProfessional Edition",
        subtitle: &[
            ("Enterprise Chat Assistant", Tone::Blue),
            ("Type 'quit' to exit session", Tone::Dim),
        ],
    },
    Style {
        name: "fun",
        display_name: "Fun",
        ascii_art: FUN_ART,
        subtitle: &[
            ("✨ Let's chat! ✨", Tone::Magenta),
            ("Type 'quit' when you're done", Tone::Yellow),
        ],
    },
];

/// Banner art supplied by the caller instead of a preset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomBanner {
    pub ascii_art: String,
    /// Shown under the art; the default subtitle when absent
    pub subtitle: Option<String>,
}

impl CustomBanner {
    pub fn new(ascii_art: impl Into<String>) -> Self {
        Self {
            ascii_art: ascii_art.into(),
            subtitle: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// What a session prints before the first prompt
#[derive(Debug, Clone)]
pub enum Banner {
    Preset(&'static Style),
    Custom(CustomBanner),
}

impl Style {
    pub fn by_name(name: &str) -> Option<&'static Style> {
        STYLES.iter().find(|s| s.name == name)
    }

    pub fn default_style() -> &'static Style {
        &STYLES[0]
    }

    pub fn subtitle_text(&self) -> String {
        self.subtitle
            .iter()
            .map(|(line, _)| *line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Available styles as `(name, display name)` pairs
pub fn list_styles() -> Vec<(&'static str, &'static str)> {
    STYLES.iter().map(|s| (s.name, s.display_name)).collect()
}

/// Plain-text preview of a style
pub fn style_preview(name: &str) -> Option<String> {
    let style = Style::by_name(name)?;
    Some(format!(
        "=== {} Style ===\n\n{}\n\n{}",
        style.display_name,
        style.ascii_art,
        style.subtitle_text()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_styles() {
        let names: Vec<_> = list_styles().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["default", "minimal", "hacker", "professional", "fun"]);
        assert_eq!(Style::default_style().name, "default");
    }

    #[test]
    fn test_style_preview() {
        assert_eq!(
            style_preview("minimal").unwrap(),
            "=== Minimal Style ===\n\nbespoken\n\nchat assistant"
        );
        assert!(style_preview("neon").is_none());
        assert!(Style::by_name("neon").is_none());
    }
}
