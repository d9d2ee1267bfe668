use serde::{Deserialize, Serialize};
use crate::normalize::{normalize, normalize_opt};

/// A catalog entry (a book)
///
/// The normalized title and the combined feature text are derived from the
/// raw fields on construction and refreshed by every setter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ItemFields", into = "ItemFields")]
pub struct Item {
    title: String,
    author: String,
    publisher: Option<String>,
    year: Option<i32>,
    image_url: Option<String>,
    normalized_title: String,
    features: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ItemFields {
    title: String,
    author: String,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    image_url: Option<String>,
}

impl From<ItemFields> for Item {
    fn from(f: ItemFields) -> Self {
        Item::new(f.title, f.author)
            .with_publisher(f.publisher)
            .with_year(f.year)
            .with_image_url(f.image_url)
    }
}

impl From<Item> for ItemFields {
    fn from(item: Item) -> Self {
        ItemFields {
            title: item.title,
            author: item.author,
            publisher: item.publisher,
            year: item.year,
            image_url: item.image_url,
        }
    }
}

impl Item {
    #[must_use]
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        let mut item = Self {
            title: title.into(),
            author: author.into(),
            publisher: None,
            year: None,
            image_url: None,
            normalized_title: String::new(),
            features: String::new(),
        };
        item.refresh();
        item
    }

    #[inline]
    #[must_use]
    pub fn with_publisher(mut self, publisher: Option<String>) -> Self {
        self.set_publisher(publisher);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.refresh();
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
        self.refresh();
    }

    pub fn set_publisher(&mut self, publisher: Option<String>) {
        self.publisher = publisher;
        self.refresh();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Title as used for query matching
    pub fn normalized_title(&self) -> &str {
        &self.normalized_title
    }

    /// Text the feature index is built from:
    /// normalized title, normalized author, raw publisher.
    pub fn features(&self) -> &str {
        &self.features
    }

    /// Case-insensitive substring match against an already normalized needle
    #[inline]
    pub fn title_contains(&self, normalized_needle: &str) -> bool {
        self.normalized_title.contains(normalized_needle)
    }

    fn refresh(&mut self) {
        self.normalized_title = normalize(&self.title);
        self.features = format!(
            "{} {} {}",
            self.normalized_title,
            normalize_opt(Some(&self.author)),
            self.publisher.as_deref().unwrap_or(""),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_combine_fields() {
        let item = Item::new("The Hobbit!", "J.R.R. Tolkien")
            .with_publisher(Some("Houghton-Mifflin".to_string()));
        assert_eq!(item.normalized_title(), "the hobbit");
        assert_eq!(item.features(), "the hobbit jrr tolkien Houghton-Mifflin");
    }

    #[test]
    fn test_missing_publisher_is_empty() {
        let item = Item::new("Dune", "Frank Herbert");
        assert_eq!(item.features(), "dune frank herbert ");
    }

    #[test]
    fn test_setters_recompute_features() {
        let mut item = Item::new("Emma", "Austen");
        item.set_title("Persuasion");
        assert_eq!(item.normalized_title(), "persuasion");
        assert!(item.features().starts_with("persuasion austen"));

        item.set_author("Jane Austen");
        assert_eq!(item.features(), "persuasion jane austen ");
    }

    #[test]
    fn test_deserialize_refreshes_derived_fields() {
        let item: Item = serde_json::from_value(serde_json::json!({
            "title": "Fellowship of the Ring",
            "author": "Tolkien",
            "year": 1954
        }))
        .unwrap();
        assert_eq!(item.normalized_title(), "fellowship of the ring");
        assert_eq!(item.year(), Some(1954));
        assert!(item.title_contains("ring"));
    }
}
