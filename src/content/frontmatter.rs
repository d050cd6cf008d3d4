//! Front-matter parsing

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{IndexError, Result};

/// Delimiter line that opens and closes a front-matter block
const DELIMITER: &str = "---";

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> std::result::Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// An empty YAML key (`sort:`) is null; read it as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_published<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_published))
}

/// Metadata block at the head of a category index or document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub name: String,
    pub keywords: String,
    pub description: String,
    /// Files are published unless the block says otherwise
    #[serde(default = "default_published", deserialize_with = "null_as_published")]
    pub published: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub sort: i64,
    pub icon: String,
    pub url: String,
    pub image: String,
    #[serde(deserialize_with = "string_or_vec", default)]
    pub tags: Vec<String>,
    pub create_time: Option<String>,
    /// Arbitrary data passed through untouched
    pub custom: serde_yaml::Value,
}

fn default_published() -> bool {
    true
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            name: String::new(),
            keywords: String::new(),
            description: String::new(),
            published: true,
            sort: 0,
            icon: String::new(),
            url: String::new(),
            image: String::new(),
            tags: Vec::new(),
            create_time: None,
            custom: serde_yaml::Value::Null,
        }
    }
}

impl FrontMatter {
    /// Split content into the raw YAML block (if any) and the body.
    ///
    /// A block exists only when the first line is exactly `---` and a later
    /// line is exactly `---`. Otherwise the whole content is the body.
    pub fn split(content: &str) -> (Option<&str>, &str) {
        let first = match content.split_inclusive('\n').next() {
            Some(line) if is_delimiter(line) => line,
            _ => return (None, content),
        };

        let rest = &content[first.len()..];
        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            if is_delimiter(line) {
                return (Some(&rest[..offset]), &rest[offset + line.len()..]);
            }
            offset += line.len();
        }

        // Unclosed block
        (None, content)
    }

    /// Parse front-matter from content string
    /// Returns (front_matter, body)
    pub fn parse(content: &str) -> std::result::Result<(Self, &str), serde_yaml::Error> {
        match Self::split(content) {
            (Some(yaml), body) if !yaml.trim().is_empty() => {
                let fm = serde_yaml::from_str::<FrontMatter>(yaml)?;
                Ok((fm, body))
            }
            (_, body) => Ok((FrontMatter::default(), body)),
        }
    }

    /// Parse the create_time string into a DateTime
    pub fn parse_create_time(&self) -> Option<DateTime<Local>> {
        self.create_time.as_deref().and_then(parse_date_string)
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches(['\n', '\r']) == DELIMITER
}

/// Parse a date string in various formats
fn parse_date_string(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&dt).earliest();
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            let dt = d.and_hms_opt(0, 0, 0)?;
            return Local.from_local_datetime(&dt).earliest();
        }
    }

    None
}

/// A parsed Markdown file: metadata, body and timestamps
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub front_matter: FrontMatter,
    pub body: String,
    /// From front matter, falling back to the modification time
    pub create_time: DateTime<Local>,
    /// Always the filesystem modification time
    pub update_time: DateTime<Local>,
}

/// Read and parse one Markdown file
pub fn parse_file(path: &Path) -> Result<SourceFile> {
    let content = fs::read_to_string(path).map_err(|e| IndexError::io(path, e))?;
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| IndexError::io(path, e))?;
    let update_time = DateTime::<Local>::from(modified);

    let (front_matter, body) = FrontMatter::parse(&content).map_err(|e| IndexError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let create_time = front_matter.parse_create_time().unwrap_or(update_time);
    let body = body.to_string();

    Ok(SourceFile {
        front_matter,
        body,
        create_time,
        update_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use tempfile::TempDir;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
name: Hello World
sort: 3
tags:
  - rust
  - web
custom:
  color: blue
---
This is the content.
"#;

        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.name, "Hello World");
        assert_eq!(fm.sort, 3);
        assert_eq!(fm.tags, vec!["rust", "web"]);
        assert!(fm.published);
        assert_eq!(fm.custom["color"].as_str(), Some("blue"));
        assert_eq!(body, "This is the content.\n");
    }

    #[test]
    fn test_no_frontmatter_keeps_whole_body() {
        let content = "# Title\n\nJust text.\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert!(fm.published);
        assert_eq!(body, content);
    }

    #[test]
    fn test_single_string_tags() {
        let content = "---\nname: One\ntags: notes\n---\nbody\n";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.tags, vec!["notes"]);
    }

    #[test]
    fn test_published_false() {
        let content = "---\npublished: false\n---\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert!(!fm.published);
        assert_eq!(body, "");
    }

    #[test]
    fn test_empty_block_uses_defaults() {
        let (fm, body) = FrontMatter::parse("---\n---\nbody\n").unwrap();
        assert!(fm.published);
        assert!(fm.name.is_empty());
        assert_eq!(body, "body\n");
    }

    #[test]
    fn test_empty_keys_use_defaults() {
        let content = "---\nname:\nsort:\npublished:\ntags:\ncustom:\n---\nbody\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.sort, 0);
        assert!(fm.published);
        assert!(fm.name.is_empty());
        assert!(fm.tags.is_empty());
        assert_eq!(body, "body\n");
    }

    #[test]
    fn test_unclosed_block_is_body() {
        let content = "---\nname: Dangling\n\nNo closing line.\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert!(fm.name.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_delimiter_must_be_exact() {
        let content = "----\nname: x\n---\nrest\n";
        let (block, body) = FrontMatter::split(content);
        assert!(block.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn test_crlf_delimiters() {
        let content = "---\r\nname: Windows\r\n---\r\nbody\r\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.name, "Windows");
        assert_eq!(body, "body\r\n");
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let content = "---\nname: [unterminated\n---\nbody\n";
        assert!(FrontMatter::parse(content).is_err());
    }

    #[test]
    fn test_parse_create_time() {
        let fm = FrontMatter {
            create_time: Some("2024-01-15 10:30:00".to_string()),
            ..Default::default()
        };
        let dt = fm.parse_create_time().unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-01-15 10:30");

        let fm = FrontMatter {
            create_time: Some("2023/06/01".to_string()),
            ..Default::default()
        };
        assert_eq!(fm.parse_create_time().unwrap().month(), 6);

        let fm = FrontMatter {
            create_time: Some("not a date".to_string()),
            ..Default::default()
        };
        assert!(fm.parse_create_time().is_none());
    }

    #[test]
    fn test_parse_file_update_time_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.md");
        fs::write(
            &path,
            "---\nname: Doc\ncreate_time: 2020-02-02\nupdate_time: 1999-01-01\n---\nBody\n",
        )
        .unwrap();

        let parsed = parse_file(&path).unwrap();
        let modified = DateTime::<Local>::from(fs::metadata(&path).unwrap().modified().unwrap());
        assert_eq!(parsed.update_time, modified);
        assert_eq!(parsed.create_time.year(), 2020);
        assert_eq!(parsed.body, "Body\n");
    }

    #[test]
    fn test_parse_file_create_time_falls_back_to_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.md");
        fs::write(&path, "plain body").unwrap();

        let parsed = parse_file(&path).unwrap();
        assert_eq!(parsed.create_time, parsed.update_time);
        assert_eq!(parsed.body, "plain body");
    }

    #[test]
    fn test_parse_file_missing() {
        let dir = TempDir::new().unwrap();
        let err = parse_file(&dir.path().join("missing.md")).unwrap_err();
        assert!(matches!(err, IndexError::Io { .. }));
    }

    #[test]
    fn test_parse_file_bad_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.md");
        fs::write(&path, "---\ntags: {a: [\n---\n").unwrap();
        let err = parse_file(&path).unwrap_err();
        assert!(matches!(err, IndexError::Parse { .. }));
    }
}
