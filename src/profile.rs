//! Subscription profile loader
//! Profiles live in a JSON file that may carry `//`, `#` and `/* */` comments

use crate::error::{BridgeError, Result};
use crate::model::SubscriptionProfile;
use std::path::Path;

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Str,
    StrEscape,
    LineComment,
    BlockComment,
    BlockCommentStar,
}

/// Remove comments outside of string literals.
/// Newlines are kept so parser positions still point at the original line.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = State::Code;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        state = match state {
            State::Code => match c {
                '"' => {
                    out.push(c);
                    State::Str
                }
                '#' => State::LineComment,
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    State::LineComment
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    State::BlockComment
                }
                _ => {
                    out.push(c);
                    State::Code
                }
            },
            State::Str => {
                out.push(c);
                match c {
                    '\\' => State::StrEscape,
                    '"' => State::Code,
                    _ => State::Str,
                }
            }
            State::StrEscape => {
                out.push(c);
                State::Str
            }
            State::LineComment => {
                if c == '\n' {
                    out.push(c);
                    State::Code
                } else {
                    State::LineComment
                }
            }
            State::BlockComment | State::BlockCommentStar => {
                if c == '\n' {
                    out.push(c);
                }
                match c {
                    '/' if state == State::BlockCommentStar => State::Code,
                    '*' => State::BlockCommentStar,
                    _ => State::BlockComment,
                }
            }
        };
    }

    out
}

/// Parse a profile list from JSONC text
pub fn parse_profiles(text: &str) -> serde_json::Result<Vec<SubscriptionProfile>> {
    serde_json::from_str(&strip_comments(text))
}

fn check_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(BridgeError::ProfileConfigMissing);
    }
    Ok(())
}

fn decode_profiles(path: &Path, text: std::io::Result<String>) -> Result<Vec<SubscriptionProfile>> {
    let text = text.map_err(|source| BridgeError::ProfileLoad {
        path: path.to_path_buf(),
        source,
    })?;

    parse_profiles(&text).map_err(|source| BridgeError::ProfileParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the ordered profile list from `path`
pub fn load_profiles<P: AsRef<Path>>(path: P) -> Result<Vec<SubscriptionProfile>> {
    let path = path.as_ref();
    check_path(path)?;
    decode_profiles(path, std::fs::read_to_string(path))
}

/// Same as `load_profiles`, reading through `tokio::fs`
pub async fn load_profiles_async<P: AsRef<Path>>(path: P) -> Result<Vec<SubscriptionProfile>> {
    let path = path.as_ref();
    check_path(path)?;
    decode_profiles(path, tokio::fs::read_to_string(path).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_strip_comments_keeps_strings() {
        let text = r#"{
            // line comment
            "path": "/a//b", # hash comment
            /* block
               comment */ "host": "h#1 /* not a comment */",
            "esc": "quote \" // still string"
        }"#;
        let value: serde_json::Value = serde_json::from_str(&strip_comments(text)).unwrap();
        assert_eq!(value["path"], "/a//b");
        assert_eq!(value["host"], "h#1 /* not a comment */");
        assert_eq!(value["esc"], "quote \" // still string");
    }

    #[test]
    fn test_block_comment_with_stars() {
        let stripped = strip_comments("[1, /** two **/ 3]");
        let value: Vec<u32> = serde_json::from_str(&stripped).unwrap();
        assert_eq!(value, vec![1, 3]);
    }

    #[test]
    fn test_load_profiles_preserves_order() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"[
                // reality first
                {{"protocol": "vless", "network": "tcp", "security": "reality", "address": "a.example.com", "password": "PBK"}},
                {{"protocol": "vmess", "network": "ws", "address": "b.example.com", "level": -1, "alpn": ["h2", "http/1.1"]}}
            ]"#
        )
        .unwrap();

        let profiles = load_profiles(file.path()).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].address, "a.example.com");
        assert_eq!(profiles[0].password, "PBK");
        assert_eq!(profiles[1].level, -1);
        assert_eq!(profiles[1].alpn, vec!["h2", "http/1.1"]);
    }

    #[test]
    fn test_load_profiles_errors() {
        assert!(matches!(load_profiles(""), Err(BridgeError::ProfileConfigMissing)));
        assert!(matches!(
            load_profiles("/nonexistent/subs.jsonc"),
            Err(BridgeError::ProfileLoad { .. })
        ));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(load_profiles(file.path()), Err(BridgeError::ProfileParse { .. })));
    }

    #[tokio::test]
    async fn test_load_profiles_async() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"protocol": "vless", "address": "a.example.com"}}] # trailing"#).unwrap();

        let profiles = load_profiles_async(file.path()).await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].address, "a.example.com");

        assert!(matches!(
            load_profiles_async("").await,
            Err(BridgeError::ProfileConfigMissing)
        ));
        assert!(matches!(
            load_profiles_async("/nonexistent/subs.jsonc").await,
            Err(BridgeError::ProfileLoad { .. })
        ));
    }
}
