//! Front-matter extraction for command and skill markdown files.
//!
//! The recognized format is a leading block delimited by `---` lines holding
//! `name:` and `description:` fields. This is deliberately not a YAML parser:
//! the two fields are plain line extractions (plus the `description: |`
//! block-scalar form), and anything malformed degrades to an absent field
//! rather than an error.

use std::sync::LazyLock;

use regex::Regex;

/// Fields recognized in a leading `---` block. Either, both, or neither may
/// be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    pub name: Option<String>,
    pub description: Option<String>,
}

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"\A---\s*\n(?s:(.*?))\n---"));
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^name:\s*(.+)$"));
static DESC_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?m)^description:\s*\|\s*\n((?:[ \t]+.+\n?)+)"));
static DESC_LINE_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^description:\s*(.+)$"));

// Patterns are literals validated by the tests below.
#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static front-matter pattern")
}

/// Extract the recognized fields from raw file text.
///
/// Total function: input without a leading `---` block (or with the block
/// anywhere but the very start of the input) yields no fields.
pub fn parse(content: &str) -> Frontmatter {
    let Some(block) = BLOCK_RE.captures(content) else {
        return Frontmatter::default();
    };
    let body = &block[1];

    Frontmatter {
        name: NAME_RE.captures(body).map(|c| c[1].trim().to_string()),
        description: parse_description(body),
    }
}

/// The block-scalar form wins over the single-line form: continuation lines
/// are individually trimmed, blanks dropped, and joined with single spaces.
fn parse_description(body: &str) -> Option<String> {
    if let Some(caps) = DESC_BLOCK_RE.captures(body) {
        let joined = caps[1]
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        return Some(joined);
    }
    DESC_LINE_RE.captures(body).map(|c| c[1].trim().to_string())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_leading_block_yields_no_fields() {
        assert_eq!(parse("# Just markdown\nNo metadata here.\n"), Frontmatter::default());
        assert_eq!(parse(""), Frontmatter::default());
    }

    #[test]
    fn block_must_start_the_input() {
        let content = "\n---\nname: late\n---\nbody\n";
        assert_eq!(parse(content), Frontmatter::default());
    }

    #[test]
    fn missing_closing_delimiter_yields_no_fields() {
        assert_eq!(parse("---\nname: test\nno closing\n"), Frontmatter::default());
    }

    #[test]
    fn single_line_fields() {
        let content = "---\nname: my-command\ndescription: A command with description\n---\n# Body\n";
        let fm = parse(content);
        assert_eq!(fm.name.as_deref(), Some("my-command"));
        assert_eq!(fm.description.as_deref(), Some("A command with description"));
    }

    #[test]
    fn fields_are_independent() {
        let fm = parse("---\nname: only-name\n---\nbody\n");
        assert_eq!(fm.name.as_deref(), Some("only-name"));
        assert!(fm.description.is_none());

        let fm = parse("---\ndescription: only description\n---\nbody\n");
        assert!(fm.name.is_none());
        assert_eq!(fm.description.as_deref(), Some("only description"));
    }

    #[test]
    fn block_scalar_description_joins_trimmed_lines() {
        let content = "---\ndescription: |\n  This is a multiline\n  description that spans\n  multiple lines\n---\nbody\n";
        let fm = parse(content);
        assert_eq!(
            fm.description.as_deref(),
            Some("This is a multiline description that spans multiple lines")
        );
    }

    #[test]
    fn block_scalar_stops_at_first_unindented_line() {
        let content = "---\ndescription: |\n  first part\n  second part\nname: after\n---\nbody\n";
        let fm = parse(content);
        assert_eq!(fm.description.as_deref(), Some("first part second part"));
        assert_eq!(fm.name.as_deref(), Some("after"));
    }

    #[test]
    fn bare_pipe_without_continuation_falls_back_to_the_scalar_form() {
        // `description: |` with no indented lines reads as a literal pipe.
        let fm = parse("---\ndescription: |\n---\nbody\n");
        assert_eq!(fm.description.as_deref(), Some("|"));
    }

    #[test]
    fn values_are_trimmed() {
        let fm = parse("---\nname:    spaced-out   \n---\n");
        assert_eq!(fm.name.as_deref(), Some("spaced-out"));
    }

    #[test]
    fn unrecognized_fields_are_ignored() {
        let content = "---\nauthor: someone\nname: real\ntags: a, b\n---\n";
        let fm = parse(content);
        assert_eq!(fm.name.as_deref(), Some("real"));
        assert!(fm.description.is_none());
    }
}
