use std::fmt;

/// Identifier part of a [`Tag`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagId {
    /// Any list of the tag's type. Only entries tagged with `LIST`
    /// themselves are hit by invalidating it.
    List,
    /// A concrete identifier or a named sentinel such as `FEATURED`.
    Id(String),
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("LIST"),
            Self::Id(id) => f.write_str(id),
        }
    }
}

/// Invalidation label attached to cached entries.
///
/// Matching is exact: `{Pet, LIST}` and `{Pet, "42"}` are unrelated tags,
/// so invalidating one never touches entries carrying only the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    pub kind: String,
    pub id: TagId,
}

impl Tag {
    /// Tag for a concrete id (or named sentinel) of a type.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            kind: kind.into(),
            id: if id == "LIST" { TagId::List } else { TagId::Id(id) },
        }
    }

    /// The `{kind, LIST}` tag.
    pub fn list(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: TagId::List,
        }
    }

    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self.id, TagId::List)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_sentinel() {
        assert_eq!(Tag::new("Pet", "LIST"), Tag::list("Pet"));
        assert!(Tag::list("Pet").is_list());
        assert!(!Tag::new("Pet", "42").is_list());
    }

    #[test]
    fn test_tags_are_exact() {
        assert_ne!(Tag::new("Pet", "42"), Tag::list("Pet"));
        assert_ne!(Tag::new("Pet", "42"), Tag::new("Breeder", "42"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Tag::list("Interest").to_string(), "Interest:LIST");
        assert_eq!(Tag::new("Interest", "PENDING").to_string(), "Interest:PENDING");
    }
}
