//! Frontmatter extraction and parsing.

use serde_yaml::{Mapping, Value};

/// Parsed frontmatter: an arbitrary YAML mapping of page attributes.
pub type Frontmatter = Mapping;

/// Line that opens and closes a frontmatter block.
const DELIMITER: &str = "---";

/// Keys whose single-string value is split into a list of words.
const WORD_LIST_KEYS: [&str; 2] = ["tags", "categories"];

/// Result of splitting a raw document.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// Parsed frontmatter, `None` when the document has none (or an empty one)
    pub frontmatter: Option<Frontmatter>,

    /// Everything after the closing delimiter
    pub body: String,
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unterminated frontmatter block - missing closing ---")]
    Unterminated,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),

    #[error("Frontmatter must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

/// Split a raw document into frontmatter and body.
///
/// The block is only recognized when the very first line is `---` (a trailing
/// carriage return is tolerated). When the block parses to an empty or falsy
/// value the document is treated as having no frontmatter at all and the body
/// is the whole input, delimiters included.
pub fn extract(source: &str) -> Result<Extracted, FrontmatterError> {
    let lines: Vec<&str> = source.split('\n').collect();

    if !is_delimiter(lines[0]) {
        return Ok(without_frontmatter(source));
    }

    let Some(close) = lines
        .iter()
        .skip(1)
        .position(|line| is_delimiter(line))
        .map(|offset| offset + 1)
    else {
        return Err(FrontmatterError::Unterminated);
    };

    let yaml = lines[1..close].join("\n");
    let value = if yaml.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(&yaml).map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?
    };

    let mut frontmatter = match value {
        Value::Mapping(mapping) if !mapping.is_empty() => mapping,
        value if is_falsy(&value) => return Ok(without_frontmatter(source)),
        value => return Err(FrontmatterError::NotAMapping(kind_of(&value))),
    };

    split_word_lists(&mut frontmatter);

    Ok(Extracted {
        frontmatter: Some(frontmatter),
        body: lines[close + 1..].join("\n"),
    })
}

fn is_delimiter(line: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line) == DELIMITER
}

fn without_frontmatter(source: &str) -> Extracted {
    Extracted {
        frontmatter: None,
        body: source.to_string(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        Value::Tagged(tagged) => is_falsy(&tagged.value),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// `tags: "a b  c"` becomes `tags: [a, b, c]`; sequences are left alone.
fn split_word_lists(frontmatter: &mut Frontmatter) {
    for key in WORD_LIST_KEYS {
        let list = match frontmatter.get(key) {
            Some(Value::String(words)) => words
                .split_whitespace()
                .map(|word| Value::String(word.to_string()))
                .collect(),
            _ => continue,
        };
        frontmatter.insert(Value::String(key.to_string()), Value::Sequence(list));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(value: Option<&Value>) -> Vec<String> {
        value
            .and_then(Value::as_sequence)
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn extracts_valid_frontmatter() {
        let source = "---\ntitle: Hello\nlayout: post\n---\n# Heading\n\nText";

        let extracted = extract(source).unwrap();
        let fm = extracted.frontmatter.unwrap();

        assert_eq!(fm.get("title").and_then(Value::as_str), Some("Hello"));
        assert_eq!(fm.get("layout").and_then(Value::as_str), Some("post"));
        assert_eq!(extracted.body, "# Heading\n\nText");
    }

    #[test]
    fn handles_no_frontmatter() {
        let source = "# Just Markdown\n---\nNo frontmatter here.";

        let extracted = extract(source).unwrap();

        assert!(extracted.frontmatter.is_none());
        assert_eq!(extracted.body, source);
    }

    #[test]
    fn requires_delimiter_on_first_line() {
        let source = "\n---\ntitle: x\n---\nbody";

        let extracted = extract(source).unwrap();

        assert!(extracted.frontmatter.is_none());
        assert_eq!(extracted.body, source);
    }

    #[test]
    fn tolerates_carriage_returns() {
        let source = "---\r\ntitle: Windows\r\n---\r\nBody line\r\n";

        let extracted = extract(source).unwrap();
        let fm = extracted.frontmatter.unwrap();

        assert_eq!(fm.get("title").and_then(Value::as_str), Some("Windows"));
        assert_eq!(extracted.body, "Body line\r\n");
    }

    #[test]
    fn removes_only_the_block() {
        let source = "---\na: 1\n---\n\n---\nstill body\n";

        let extracted = extract(source).unwrap();

        assert_eq!(extracted.body, "\n---\nstill body\n");
    }

    #[test]
    fn empty_block_keeps_whole_input() {
        let source = "---\n---\n<p>hi</p>";

        let extracted = extract(source).unwrap();

        assert!(extracted.frontmatter.is_none());
        assert_eq!(extracted.body, source);
    }

    #[test]
    fn falsy_block_keeps_whole_input() {
        for source in ["---\nnull\n---\nbody", "---\nfalse\n---\nbody", "---\n{}\n---\nbody"] {
            let extracted = extract(source).unwrap();

            assert!(extracted.frontmatter.is_none(), "{source:?}");
            assert_eq!(extracted.body, source);
        }
    }

    #[test]
    fn errors_on_unterminated_frontmatter() {
        let source = "---\ntitle: Test\n# No closing";

        let result = extract(source);

        assert!(matches!(result, Err(FrontmatterError::Unterminated)));
    }

    #[test]
    fn errors_on_invalid_yaml() {
        let source = "---\ntitle: [invalid yaml\n---\n";

        let result = extract(source);

        assert!(matches!(result, Err(FrontmatterError::InvalidYaml(_))));
    }

    #[test]
    fn errors_on_scalar_frontmatter() {
        let source = "---\njust a sentence\n---\nbody";

        let result = extract(source);

        assert!(matches!(
            result,
            Err(FrontmatterError::NotAMapping("a string"))
        ));
    }

    #[test]
    fn splits_string_tags_on_whitespace() {
        let source = "---\ntags: \"a b  c\"\ncategories: news\n---\n";

        let fm = extract(source).unwrap().frontmatter.unwrap();

        assert_eq!(strings(fm.get("tags")), vec!["a", "b", "c"]);
        assert_eq!(strings(fm.get("categories")), vec!["news"]);
    }

    #[test]
    fn leaves_tag_sequences_unchanged() {
        let source = "---\ntags: [a, b]\ncategories: one two\n---\n";

        let fm = extract(source).unwrap().frontmatter.unwrap();

        assert_eq!(strings(fm.get("tags")), vec!["a", "b"]);
        assert_eq!(strings(fm.get("categories")), vec!["one", "two"]);
    }
}
