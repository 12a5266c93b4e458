//! Translation of `ksvalidator` stderr into diagnostics
//!
//! ksvalidator reports each problem as two lines:
//!
//! ```text
//! The following problem occurred on line 5 of the kickstart file:
//!
//! Unknown command: bootlaoder
//! ```
//!
//! Blank lines are dropped, then lines are consumed in pairs: a location
//! line carrying `on line N of`, followed by the message. A location line
//! that does not match is treated as noise and scanning moves on by one line.
//! The pairing is a heuristic tied to ksvalidator's current output.

use std::sync::OnceLock;

use regex::Regex;
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticRelatedInformation, DiagnosticSeverity, Location, Position, Range, Url,
};

/// Source label attached to every diagnostic.
pub const SOURCE: &str = "ksvalidator";

/// Annotation used for related information.
pub const RELATED_MESSAGE: &str = "ksvalidator considers this line invalid";

fn location_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"on line (\d+) of").expect("valid location pattern"))
}

/// 1-based line number reported on a location line.
fn reported_line(line: &str) -> Option<u32> {
    location_pattern()
        .captures(line)
        .and_then(|caps| caps[1].parse().ok())
}

/// Range covering the whole of a 0-based line.
pub fn whole_line(line: u32) -> Range {
    Range {
        start: Position { line, character: 0 },
        end: Position {
            line,
            character: u32::MAX,
        },
    }
}

/// Parse validator stderr into diagnostics, in report order.
///
/// When `related_to` is set, each diagnostic carries one related-information
/// entry pointing at the same line of that document.
pub fn parse_stderr(stderr: &str, related_to: Option<&Url>) -> Vec<Diagnostic> {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.is_empty()).collect();
    let mut diagnostics = Vec::new();

    let mut i = 0;
    while i + 1 < lines.len() {
        let Some(reported) = reported_line(lines[i]) else {
            i += 1;
            continue;
        };

        let range = whole_line(reported.saturating_sub(1));
        let related_information = related_to.map(|uri| {
            vec![DiagnosticRelatedInformation {
                location: Location {
                    uri: uri.clone(),
                    range,
                },
                message: RELATED_MESSAGE.to_string(),
            }]
        });

        diagnostics.push(Diagnostic {
            range,
            severity: Some(DiagnosticSeverity::WARNING),
            source: Some(SOURCE.to_string()),
            message: lines[i + 1].trim().to_string(),
            related_information,
            ..Default::default()
        });
        i += 2;
    }

    diagnostics
}
