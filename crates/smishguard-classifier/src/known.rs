//! Known fraudulent messages and URLs.
//!
//! Both lists are loaded once at startup and never change afterwards. A
//! missing or unreadable list aborts startup: there is no empty fallback.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use smishguard_common::SmishError;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read known-item list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<StoreError> for SmishError {
    fn from(e: StoreError) -> Self {
        SmishError::KnownItems(e.to_string())
    }
}

#[derive(Debug, Default)]
pub struct KnownItemStore {
    messages: HashSet<String>,
    urls: HashSet<String>,
}

fn collect_lines<I, S>(lines: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|l| l.as_ref().trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn read_list(path: &Path) -> Result<HashSet<String>, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(collect_lines(content.lines()))
}

impl KnownItemStore {
    /// Read both newline-delimited lists. Blank lines are ignored.
    pub fn load(messages_path: &Path, urls_path: &Path) -> Result<Self, StoreError> {
        let store = Self {
            messages: read_list(messages_path)?,
            urls: read_list(urls_path)?,
        };
        info!(
            messages = store.messages.len(),
            urls = store.urls.len(),
            "known-item lists loaded"
        );
        Ok(store)
    }

    pub fn from_lines<M, U, S, T>(messages: M, urls: U) -> Self
    where
        M: IntoIterator<Item = S>,
        S: AsRef<str>,
        U: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self { messages: collect_lines(messages), urls: collect_lines(urls) }
    }

    /// Exact match of an already trimmed message.
    pub fn contains(&self, message: &str) -> bool {
        self.messages.contains(message)
    }

    pub fn contains_any<'a, I>(&self, urls: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        urls.into_iter().any(|u| self.urls.contains(u))
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn url_count(&self) -> usize {
        self.urls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines_trims_and_skips_blanks() {
        let store = KnownItemStore::from_lines(["  pay your toll  ", "", "   "], ["http://a.biz\r"]);
        assert_eq!(store.message_count(), 1);
        assert!(store.contains("pay your toll"));
        assert!(store.contains_any(["http://a.biz"]));
    }

    #[test]
    fn test_contains_any_requires_exact_url() {
        let store = KnownItemStore::from_lines(Vec::<String>::new(), ["http://known-scam.biz/claim"]);
        assert!(!store.contains_any(["known-scam.biz"]));
        assert!(!store.contains_any(std::iter::empty()));
        assert!(store.contains_any(["x.com", "http://known-scam.biz/claim"]));
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let messages = dir.path().join("messages.txt");
        let urls = dir.path().join("urls.txt");
        std::fs::write(&messages, "[Web발신] 택배 주소지 불명\n\nYour account is locked\n").unwrap();
        std::fs::write(&urls, "http://known-scam.biz/claim\n").unwrap();

        let store = KnownItemStore::load(&messages, &urls).unwrap();
        assert_eq!(store.message_count(), 2);
        assert_eq!(store.url_count(), 1);
        assert!(store.contains("[Web발신] 택배 주소지 불명"));
    }

    #[test]
    fn test_missing_file_is_fatal_and_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let urls = dir.path().join("urls.txt");
        std::fs::write(&urls, "x.com\n").unwrap();

        let err = KnownItemStore::load(&dir.path().join("absent.txt"), &urls).unwrap_err();
        assert!(err.to_string().contains("absent.txt"));

        let smish: SmishError = err.into();
        assert!(smish.is_fatal());
    }
}
