//! AppleScript generation for Things 3
//!
//! Every builder is a pure function of already-validated input. User-supplied
//! text is escaped with [`escape`] before it is embedded in a string literal;
//! nothing else about the generated script is sandboxed.
//!
//! Single-item scripts live in [`single`], native batch scripts in [`batch`].
//! Lists and searches are in [`read`]; project and tag changes in [`projects`].

use chrono::NaiveDate;

pub mod batch;
pub mod projects;
pub mod read;
pub mod single;

/// Default application name used in `tell application` blocks
pub const DEFAULT_APP_NAME: &str = "Things3";

/// Builds scripts addressed to one automation target
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    app: String,
}

impl ScriptBuilder {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into() }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    /// Wrap statements in a `tell application` block
    fn tell(&self, body: &str) -> String {
        format!(
            "tell application \"{}\"\n{}\nend tell",
            escape(&self.app),
            indent(body, 1)
        )
    }
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_APP_NAME)
    }
}

/// Escape a string for use inside an AppleScript string literal.
///
/// Line breaks and tabs become `\n`, `\r` and `\t` so that a literal never
/// spans lines and block indentation cannot leak into its contents.
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Quote and escape a string as an AppleScript literal
pub fn quote(text: &str) -> String {
    format!("\"{}\"", escape(text))
}

/// Render a calendar date the way AppleScript's `date "..."` coercion expects
pub fn applescript_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y 00:00:00").to_string()
}

fn indent(text: &str, depth: usize) -> String {
    let pad = "    ".repeat(depth);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_quotes_and_backslashes() {
        assert_eq!(escape(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape(r"C:\temp"), r"C:\\temp");
        assert_eq!(quote("plain"), "\"plain\"");
    }

    #[test]
    fn test_escape_line_breaks_and_tabs() {
        assert_eq!(escape("line1\nline2"), r"line1\nline2");
        assert_eq!(escape("a\r\nb"), r"a\r\nb");
        assert_eq!(escape("col\tcol"), r"col\tcol");
        assert_eq!(escape(r"C:\new"), r"C:\\new");
        assert!(!quote("one\ntwo\r\nthree").contains('\n'));
    }

    #[test]
    fn test_multiline_literal_survives_nested_indent() {
        let script = ScriptBuilder::default().tell(&format!(
            "try\n{}\nend try",
            indent(&format!("set notes of x to {}", quote("line1\nline2")), 1)
        ));
        assert!(script.contains(r#"to "line1\nline2""#));
        assert_eq!(script.lines().count(), 5);
    }

    #[test]
    fn test_applescript_date() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert_eq!(applescript_date(date), "July 01, 2024 00:00:00");
    }

    #[test]
    fn test_tell_block() {
        let script = ScriptBuilder::default().tell("return name");
        assert_eq!(script, "tell application \"Things3\"\n    return name\nend tell");
    }
}
