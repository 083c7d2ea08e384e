//! Feed data types.

use serde::{Deserialize, Serialize};

/// One persisted post.
///
/// Serialises with the `ID`/`Header`/`Body`/`Tags` field names the
/// client-render script reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Header")]
    pub header: String,
    #[serde(rename = "Body")]
    pub body: String,
    /// Comma-separated tag tokens, stored exactly as submitted.
    #[serde(rename = "Tags")]
    pub tags: String,
}

impl FeedItem {
    /// Split the raw tag string into trimmed tokens, in order.
    ///
    /// Empty tokens are kept: `"a,,b"` yields three and `""` yields one.
    pub fn tag_tokens(&self) -> impl Iterator<Item = &str> {
        self.tags.split(',').map(str::trim)
    }
}

/// Optional narrowing of the list query. Empty strings mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedFilter {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub header: String,
}

impl FeedFilter {
    pub fn by_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn by_header(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }
}

/// A post as submitted through the creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewPost {
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(tags: &str) -> FeedItem {
        FeedItem {
            id: 1,
            header: "h".into(),
            body: "b".into(),
            tags: tags.into(),
        }
    }

    #[test]
    fn tag_tokens_are_trimmed_in_order() {
        let it = item(" x ,y,  z");
        let tokens: Vec<_> = it.tag_tokens().collect();
        assert_eq!(tokens, vec!["x", "y", "z"]);
    }

    #[test]
    fn empty_tags_yield_single_empty_token() {
        let it = item("");
        let tokens: Vec<_> = it.tag_tokens().collect();
        assert_eq!(tokens, vec![""]);
    }

    #[test]
    fn serializes_with_pascal_case_keys() {
        let json = serde_json::to_string(&item("a")).unwrap();
        assert_eq!(json, r#"{"ID":1,"Header":"h","Body":"b","Tags":"a"}"#);
    }
}
