use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Leading character of a hash whose content is itself a thunk description.
pub const THUNK_MARKER: char = 'T';

/// Separator between a thunk hash and an output tag in a reduction key.
pub const TAG_SEPARATOR: char = '#';

/// Whether a hash names a thunk or a plain value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashKind {
    /// Content is a thunk description that the caller must materialize.
    Thunk,
    /// Content is raw output bytes.
    Value,
}

/// Content identifier for a blob or thunk.
///
/// Hashes double as file names in the blob store, so construction rejects
/// anything that could escape a directory or collide with a reduction key:
/// path separators, the tag separator, whitespace, NUL, and the `.`/`..`
/// entries.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    pub fn new(hash: impl Into<String>) -> TypeResult<Self> {
        let hash = hash.into();
        validate_hash(&hash)?;
        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> HashKind {
        if self.0.starts_with(THUNK_MARKER) {
            HashKind::Thunk
        } else {
            HashKind::Value
        }
    }

    /// Returns `true` if this hash carries the thunk marker.
    pub fn is_thunk(&self) -> bool {
        self.kind() == HashKind::Thunk
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn validate_hash(hash: &str) -> TypeResult<()> {
    if hash.is_empty() {
        return Err(TypeError::EmptyHash);
    }
    let invalid = |reason| TypeError::InvalidHash { hash: hash.to_string(), reason };
    if hash == "." || hash == ".." {
        return Err(invalid("reserved path component"));
    }
    if hash.contains(['/', '\\']) {
        return Err(invalid("contains a path separator"));
    }
    if hash.contains(TAG_SEPARATOR) {
        return Err(invalid("contains the tag separator"));
    }
    if hash.chars().any(|c| c.is_whitespace() || c == '\0') {
        return Err(invalid("contains whitespace or NUL"));
    }
    Ok(())
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentHash {
    type Err = TypeError;

    fn from_str(s: &str) -> TypeResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = TypeError;

    fn try_from(value: String) -> TypeResult<Self> {
        Self::new(value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

/// Key of a reduction cache entry.
///
/// `hash` alone for the untagged output, `hash#tag` otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReductionKey(String);

impl ReductionKey {
    pub fn new(thunk: &ContentHash, tag: &str) -> TypeResult<Self> {
        if tag.is_empty() {
            return Ok(Self(thunk.as_str().to_string()));
        }
        if tag.contains(['/', '\\', '\0']) {
            return Err(TypeError::InvalidTag {
                tag: tag.to_string(),
                reason: "contains a path separator or NUL",
            });
        }
        Ok(Self(format!("{thunk}{TAG_SEPARATOR}{tag}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReductionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hash(s: &str) -> ContentHash {
        ContentHash::new(s).unwrap()
    }

    #[test]
    fn marker_classifies_kind() {
        assert_eq!(hash("TabcXYZ").kind(), HashKind::Thunk);
        assert!(hash("T").is_thunk());
        assert_eq!(hash("Vabc").kind(), HashKind::Value);
        assert!(!hash("tlower").is_thunk());
    }

    #[test]
    fn rejects_unsafe_hashes() {
        assert_eq!(ContentHash::new(""), Err(TypeError::EmptyHash));
        assert!(ContentHash::new("..").is_err());
        assert!(ContentHash::new(".").is_err());
        assert!(ContentHash::new("a/b").is_err());
        assert!(ContentHash::new("a\\b").is_err());
        assert!(ContentHash::new("a#b").is_err());
        assert!(ContentHash::new("a b").is_err());
        assert!(ContentHash::new("a\nb").is_err());
    }

    #[test]
    fn untagged_key_is_bare_hash() {
        let key = ReductionKey::new(&hash("X1"), "").unwrap();
        assert_eq!(key.as_str(), "X1");
    }

    #[test]
    fn tagged_key_joins_with_separator() {
        let key = ReductionKey::new(&hash("X1"), "out").unwrap();
        assert_eq!(key.as_str(), "X1#out");
        assert_eq!(key.to_string(), "X1#out");
    }

    #[test]
    fn tag_with_separator_is_rejected() {
        assert!(ReductionKey::new(&hash("X1"), "../etc").is_err());
    }

    #[test]
    fn serde_as_plain_string() {
        let h = hash("B1");
        assert_eq!(serde_json::to_string(&h).unwrap(), "\"B1\"");
        let back: ContentHash = serde_json::from_str("\"B1\"").unwrap();
        assert_eq!(back, h);
        assert!(serde_json::from_str::<ContentHash>("\"a/b\"").is_err());
    }

    proptest! {
        #[test]
        fn key_is_hash_then_tag(h in "[A-Za-z0-9_.-]{2,40}", tag in "[a-z0-9_.-]{1,16}") {
            prop_assume!(h != "..");
            let thunk = ContentHash::new(h.clone()).unwrap();
            let key = ReductionKey::new(&thunk, &tag).unwrap();
            prop_assert_eq!(key.as_str(), format!("{h}#{tag}"));
        }
    }
}
