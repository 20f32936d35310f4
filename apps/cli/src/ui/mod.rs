//! Operator-facing console output. Log records go through `tracing`; these
//! helpers print the run summary.

pub mod diagnostic;
pub mod theme;

pub use theme::{Icon, Theme};

pub fn info(message: impl AsRef<str>) {
    println!("{} {}", Theme::primary(Icon::Info), message.as_ref());
}

pub fn success(message: impl AsRef<str>) {
    println!("{} {}", Theme::success(Icon::Check), message.as_ref());
}

pub fn warn(message: impl AsRef<str>) {
    eprintln!("{} {}", Theme::warning(Icon::Warning), message.as_ref());
}

pub fn error(message: impl AsRef<str>) {
    eprintln!("{} {}", Theme::error(Icon::Cross), message.as_ref());
}

/// Indented list entry under a preceding heading.
pub fn item(message: impl AsRef<str>) {
    println!("  {} {}", Theme::muted(Icon::Bullet), message.as_ref());
}
