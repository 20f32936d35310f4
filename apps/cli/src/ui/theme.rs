use owo_colors::OwoColorize;
use std::fmt;

/// Colour palette for console output.
pub struct Theme;

impl Theme {
    /// Headings and informational markers (cyan).
    pub fn primary(text: impl fmt::Display) -> String {
        format!("{}", text.cyan().bold())
    }

    /// Module names (magenta).
    pub fn secondary(text: impl fmt::Display) -> String {
        format!("{}", text.magenta().bold())
    }

    pub fn success(text: impl fmt::Display) -> String {
        format!("{}", text.green().bold())
    }

    pub fn warning(text: impl fmt::Display) -> String {
        format!("{}", text.yellow().bold())
    }

    pub fn error(text: impl fmt::Display) -> String {
        format!("{}", text.red().bold())
    }

    /// Paths and secondary detail.
    pub fn muted(text: impl fmt::Display) -> String {
        format!("{}", text.dimmed())
    }
}

pub enum Icon {
    Check,
    Cross,
    Warning,
    Info,
    Bullet,
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self {
            Icon::Check => "✔",
            Icon::Cross => "✖",
            Icon::Warning => "⚠",
            Icon::Info => "ℹ",
            Icon::Bullet => "•",
        };
        write!(f, "{}", icon)
    }
}
