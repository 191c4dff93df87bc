use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use bytes::Bytes;

/// Identifier for a table, family or qualifier.
///
/// The byte form is computed once at construction and shared by every clone,
/// so two equal names always hand the store identical bytes.
#[derive(Clone)]
pub struct Name {
    text: Arc<str>,
    bytes: Bytes,
}

impl Name {
    /// Build a name from its textual form.
    pub fn of(name: impl Into<String>) -> Self {
        let text: String = name.into();
        let bytes = Bytes::copy_from_slice(text.as_bytes());
        Self {
            text: Arc::from(text),
            bytes,
        }
    }

    /// Textual form of the name.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Borrow the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the encoded bytes.
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Name").field(&&*self.text).finish()
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::of(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::of(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_names_share_byte_form() {
        let a = Name::of("family");
        let b = Name::from(String::from("family"));
        assert_eq!(a, b);
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.to_bytes(), Bytes::from_static(b"family"));
    }

    #[test]
    fn ordering_follows_bytes() {
        let mut names = vec![Name::of("b"), Name::of("a"), Name::of("B")];
        names.sort();
        let sorted: Vec<_> = names.iter().map(Name::as_str).collect();
        assert_eq!(sorted, vec!["B", "a", "b"]);
    }
}
