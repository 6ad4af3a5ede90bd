use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// Bearer credential for the results API. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Mask the token for safe display (keeps last 4 chars).
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            "***".into()
        } else {
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("***{}", tail)
        }
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&self.masked()).finish()
    }
}

/// Resolve the token from an inline value, falling back to a token file.
/// Surrounding whitespace (a trailing newline in the file) is stripped.
pub fn load_token(inline: Option<&str>, file: Option<&Path>) -> Result<BearerToken> {
    if let Some(token) = inline.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(BearerToken::new(token));
    }

    let path = file.ok_or_else(|| anyhow!("No API token configured: set MEDUX_TOKEN or MEDUX_TOKEN_FILE"))?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read token file {}", path.display()))?;

    let token = raw.trim();
    if token.is_empty() {
        return Err(anyhow!("Token file {} is empty", path.display()));
    }
    Ok(BearerToken::new(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("medux-{}-{}", name, uuid::Uuid::new_v4()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn masked_keeps_last_four() {
        assert_eq!(BearerToken::new("abcdefghijkl").masked(), "***ijkl");
        assert_eq!(BearerToken::new("short").masked(), "***");
        assert_eq!(format!("{:?}", BearerToken::new("abcdefghijkl")), "BearerToken(\"***ijkl\")");
    }

    #[test]
    fn inline_token_wins_over_file() {
        let path = temp_file("token", "from-file\n");
        let token = load_token(Some(" inline "), Some(&path)).unwrap();
        assert_eq!(token.expose(), "inline");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn file_token_is_trimmed() {
        let path = temp_file("token", "  from-file\n");
        let token = load_token(None, Some(&path)).unwrap();
        assert_eq!(token.expose(), "from-file");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_token_is_an_error() {
        assert!(load_token(Some("   "), None).is_err());

        let path = temp_file("token", "\n");
        assert!(load_token(None, Some(&path)).is_err());
        let _ = std::fs::remove_file(path);
    }
}
