//! npm-flavoured version ranges on top of `semver`.
//!
//! `semver::VersionReq` follows Cargo conventions (comma separated
//! comparators, bare versions mean caret). Manifests written by npm, yarn and
//! pnpm use whitespace separated comparators, `||` alternatives, hyphen
//! ranges and exact bare versions, so those are rewritten before parsing.

use semver::{Version, VersionReq};

const OP_CHARS: &[char] = &['<', '>', '=', '~', '^'];

/// A parsed version range: matches if any alternative matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRange {
    alternatives: Vec<VersionReq>,
}

impl ApiRange {
    /// Parses an npm range. Returns `None` for anything that is not a
    /// version range (`file:`, `git+https:`, dist tags, ...).
    pub fn parse(input: &str) -> Option<Self> {
        let alternatives = input
            .split("||")
            .map(parse_alternative)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { alternatives })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

/// Lowest concrete version named by `input` (`^1.4` -> `1.4.0`).
pub fn coerce_version(input: &str) -> Option<Version> {
    let first = input.split("||").next()?;
    let token = glue_operators(first).into_iter().next()?;
    let bare = token
        .trim_start_matches(OP_CHARS)
        .trim_start_matches(['v', 'V']);

    if let Ok(version) = Version::parse(bare) {
        return Some(version);
    }

    let mut parts = [0u64; 3];
    for (i, part) in bare.split('.').enumerate() {
        if i >= parts.len() {
            return None;
        }
        if is_wildcard(part) {
            break;
        }
        parts[i] = part.parse().ok()?;
    }
    Some(Version::new(parts[0], parts[1], parts[2]))
}

fn parse_alternative(input: &str) -> Option<VersionReq> {
    let tokens = glue_operators(input);

    let comparators: Vec<String> = match tokens.as_slice() {
        [] => return Some(VersionReq::STAR),
        [lo, dash, hi] if dash == "-" => vec![
            format!(">={}", strip_v(lo)),
            format!("<={}", strip_v(hi)),
        ],
        _ => tokens
            .iter()
            .filter(|t| !is_wildcard(t) || tokens.len() == 1)
            .map(|t| comparator(t))
            .collect::<Option<Vec<_>>>()?,
    };

    if comparators.iter().any(|c| is_wildcard(c)) {
        return Some(VersionReq::STAR);
    }

    VersionReq::parse(&comparators.join(", ")).ok()
}

/// Splits on whitespace, re-attaching lone operators (`>= 1.2.0`) to the
/// version that follows them.
fn glue_operators(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut pending = String::new();
    for raw in input.split_whitespace() {
        if raw.chars().all(|c| OP_CHARS.contains(&c)) {
            pending.push_str(raw);
            continue;
        }
        tokens.push(format!("{}{}", std::mem::take(&mut pending), raw));
    }
    if !pending.is_empty() {
        tokens.push(pending);
    }
    tokens
}

fn comparator(token: &str) -> Option<String> {
    let split = token.find(|c| !OP_CHARS.contains(&c)).unwrap_or(token.len());
    let (op, rest) = token.split_at(split);
    let rest = strip_v(rest);
    if rest.is_empty() {
        return None;
    }

    if op.is_empty() {
        if has_wildcard_part(rest) {
            // `1.x`, `1.2.*`: semver treats these as wildcards already.
            return Some(rest.to_string());
        }
        // A bare version is exact in npm (and `=1.2` means `1.2.x`).
        return Some(format!("={}", rest));
    }
    Some(format!("{}{}", op, rest))
}

fn strip_v(s: &str) -> &str {
    s.trim_start_matches(['v', 'V'])
}

fn is_wildcard(s: &str) -> bool {
    matches!(s, "*" | "x" | "X")
}

/// True for `1.x`, `1.2.*`. Prerelease and build tags are not inspected, so
/// `2.0.0-experimental` stays an exact version.
fn has_wildcard_part(version: &str) -> bool {
    version
        .split(['-', '+'])
        .next()
        .unwrap_or(version)
        .split('.')
        .any(is_wildcard)
}
