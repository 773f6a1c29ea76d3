//! Tips: short user-authored posts tagged with hashtags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lifetip_core::{DomainError, DomainResult, Page, TipId, UserId, text};

pub const TITLE_MAX_CHARS: usize = 100;
pub const CONTENT_MAX_CHARS: usize = 5000;
pub const MAX_HASHTAGS: usize = 10;
pub const HASHTAG_MAX_CHARS: usize = 30;

/// A community tip post.
///
/// # Invariants
/// - `title` and `content` are trimmed and non-empty.
/// - `hashtags` are normalized (see [`normalize_hashtag`]) and unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    pub id: TipId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub hashtags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tip {
    pub fn create(author_id: UserId, new: NewTip, now: DateTime<Utc>) -> Self {
        Self {
            id: TipId::new(),
            author_id,
            title: new.title,
            content: new.content,
            hashtags: new.hashtags,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_authored_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }

    /// Apply an edit. Returns whether anything changed.
    pub fn apply(&mut self, update: TipUpdate, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        if let Some(title) = update.title.filter(|t| *t != self.title) {
            self.title = title;
            changed = true;
        }
        if let Some(content) = update.content.filter(|c| *c != self.content) {
            self.content = content;
            changed = true;
        }
        if let Some(hashtags) = update.hashtags.filter(|h| *h != self.hashtags) {
            self.hashtags = hashtags;
            changed = true;
        }
        if changed {
            self.updated_at = now;
        }
        changed
    }
}

/// Validated input for a new tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTip {
    pub title: String,
    pub content: String,
    pub hashtags: Vec<String>,
}

impl NewTip {
    pub fn new(title: &str, content: &str, hashtags: &[String]) -> DomainResult<Self> {
        Ok(Self {
            title: text::bounded("title", title, 1, TITLE_MAX_CHARS)?,
            content: text::bounded("content", content, 1, CONTENT_MAX_CHARS)?,
            hashtags: normalize_hashtags(hashtags)?,
        })
    }
}

/// Validated partial edit of a tip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TipUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub hashtags: Option<Vec<String>>,
}

impl TipUpdate {
    pub fn new(
        title: Option<&str>,
        content: Option<&str>,
        hashtags: Option<&[String]>,
    ) -> DomainResult<Self> {
        Ok(Self {
            title: title
                .map(|t| text::bounded("title", t, 1, TITLE_MAX_CHARS))
                .transpose()?,
            content: content
                .map(|c| text::bounded("content", c, 1, CONTENT_MAX_CHARS))
                .transpose()?,
            hashtags: hashtags.map(normalize_hashtags).transpose()?,
        })
    }
}

/// Normalize one hashtag: strip a leading `#`, trim, lowercase.
pub fn normalize_hashtag(raw: &str) -> DomainResult<String> {
    let tag = raw.trim().trim_start_matches('#').trim().to_lowercase();
    if tag.is_empty() {
        return Err(DomainError::validation("hashtags", "hashtag must not be empty"));
    }
    if tag.chars().count() > HASHTAG_MAX_CHARS {
        return Err(DomainError::validation(
            "hashtags",
            format!("hashtag must be at most {HASHTAG_MAX_CHARS} characters"),
        ));
    }
    if tag.chars().any(char::is_whitespace) {
        return Err(DomainError::validation("hashtags", "hashtag must not contain spaces"));
    }
    Ok(tag)
}

/// Normalize a tag list, dropping duplicates but keeping first-seen order.
pub fn normalize_hashtags(raw: &[String]) -> DomainResult<Vec<String>> {
    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for r in raw {
        let tag = normalize_hashtag(r)?;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    if tags.len() > MAX_HASHTAGS {
        return Err(DomainError::validation(
            "hashtags",
            format!("at most {MAX_HASHTAGS} hashtags"),
        ));
    }
    Ok(tags)
}

/// Aggregate counters shown on a tip detail page.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipStats {
    pub likes: u64,
    pub saves: u64,
    pub comments: u64,
}

/// How often a hashtag is used across all tips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagCount {
    pub tag: String,
    pub count: u64,
}

/// Filter for tip listings. Results are newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TipQuery {
    /// Normalized hashtag the tip must carry.
    pub hashtag: Option<String>,
    /// Case-insensitive substring of the title or content.
    pub search: Option<String>,
    pub author_id: Option<UserId>,
    pub page: Page,
}

impl TipQuery {
    pub fn new(
        hashtag: Option<&str>,
        search: Option<&str>,
        author_id: Option<UserId>,
        page: Page,
    ) -> DomainResult<Self> {
        let hashtag = match hashtag.map(str::trim) {
            None | Some("") => None,
            Some(h) => Some(normalize_hashtag(h)?),
        };
        let search = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        Ok(Self {
            hashtag,
            search,
            author_id,
            page,
        })
    }

    /// Whether `tip` passes the filter (pagination is applied separately).
    pub fn matches(&self, tip: &Tip) -> bool {
        if let Some(author) = self.author_id {
            if tip.author_id != author {
                return false;
            }
        }
        if let Some(tag) = &self.hashtag {
            if !tip.hashtags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            let hit = tip.title.to_lowercase().contains(needle)
                || tip.content.to_lowercase().contains(needle);
            if !hit {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tags(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn sample_tip() -> Tip {
        let new = NewTip::new("Save on rent", "Check the youth housing program", &tags(&["#Housing"]))
            .unwrap();
        Tip::create(UserId::new(), new, Utc::now())
    }

    #[test]
    fn new_tip_trims_and_normalizes() {
        let new = NewTip::new("  A ", " B ", &tags(&["#Food", "food", " #tips "])).unwrap();
        assert_eq!(new.title, "A");
        assert_eq!(new.content, "B");
        assert_eq!(new.hashtags, tags(&["food", "tips"]));
    }

    #[test]
    fn new_tip_requires_title() {
        let err = NewTip::new("   ", "body", &[]).unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "title", .. }));
    }

    #[test]
    fn too_many_hashtags_rejected() {
        let raw: Vec<String> = (0..=MAX_HASHTAGS).map(|i| format!("t{i}")).collect();
        assert!(normalize_hashtags(&raw).is_err());
    }

    #[test]
    fn hashtag_with_space_rejected() {
        assert!(normalize_hashtag("two words").is_err());
        assert!(normalize_hashtag("#").is_err());
    }

    #[test]
    fn apply_reports_changes() {
        let mut tip = sample_tip();
        let before = tip.updated_at;
        let later = before + chrono::Duration::seconds(1);

        let noop = TipUpdate::new(Some("Save on rent"), None, None).unwrap();
        assert!(!tip.apply(noop, later));
        assert_eq!(tip.updated_at, before);

        let edit = TipUpdate::new(None, Some("new body"), Some(&tags(&["Money"]))).unwrap();
        assert!(tip.apply(edit, later));
        assert_eq!(tip.content, "new body");
        assert_eq!(tip.hashtags, tags(&["money"]));
        assert_eq!(tip.updated_at, later);
    }

    #[test]
    fn query_matches_hashtag_search_and_author() {
        let tip = sample_tip();

        let by_tag = TipQuery::new(Some("#HOUSING"), None, None, Page::default()).unwrap();
        assert!(by_tag.matches(&tip));

        let by_text = TipQuery::new(None, Some("YOUTH"), None, Page::default()).unwrap();
        assert!(by_text.matches(&tip));

        let other_author = TipQuery::new(None, None, Some(UserId::new()), Page::default()).unwrap();
        assert!(!other_author.matches(&tip));

        let blank = TipQuery::new(Some(" "), Some(""), None, Page::default()).unwrap();
        assert_eq!(blank.hashtag, None);
        assert_eq!(blank.search, None);
    }

    proptest! {
        #[test]
        fn normalized_hashtags_are_unique_and_lowercase(raw in proptest::collection::vec("#?[A-Za-z]{1,8}", 0..10)) {
            let out = normalize_hashtags(&raw).unwrap();
            let mut dedup = out.clone();
            dedup.sort();
            dedup.dedup();
            prop_assert_eq!(dedup.len(), out.len());
            prop_assert!(out.iter().all(|t| t.chars().all(|c| c.is_lowercase())));
        }
    }
}
