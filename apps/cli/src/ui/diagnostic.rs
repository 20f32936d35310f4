use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
#[error("Invalid manifest: {origin}")]
#[diagnostic(
    code(module_installer::manifest::parse),
    help("The file must be a JSON object with dependency sections mapping names to version strings.")
)]
pub struct ManifestParseError {
    pub origin: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("{reason}")]
    pub span: SourceSpan,

    pub reason: String,
}

/// One-character span at the line and column `serde_json` reported, or the
/// start of the text when no location is known.
pub fn parse_error_span(content: &str, error: &serde_json::Error) -> SourceSpan {
    if error.line() == 0 {
        return SourceSpan::new(SourceOffset::from(0), 0_usize);
    }
    let offset = SourceOffset::from_location(content, error.line(), error.column().max(1));
    SourceSpan::new(offset, 1_usize)
}

/// Prints a source-annotated report for JSON that failed to parse.
pub fn report_manifest_parse_error(origin: &str, content: &str, error: &serde_json::Error) {
    let err = ManifestParseError {
        origin: origin.to_string(),
        src: NamedSource::new(origin, content.to_string()),
        span: parse_error_span(content, error),
        reason: error.to_string(),
    };

    eprintln!("{:?}", miette::Report::new(err));
}
