//! Category Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Category {
    id: String,
    name: String,
    slug: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl Category {
    pub fn create(name: &str, description: Option<String>, parent_id: Option<String>) -> Result<Self, CategoryError> {
        let slug = slugify(name);
        if slug.is_empty() { return Err(CategoryError::MissingName); }
        Ok(Self { id: Uuid::now_v7().to_string(), name: name.trim().to_string(), slug, description, parent_id, created_at: Utc::now() })
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn slug(&self) -> &str { &self.slug }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn parent_id(&self) -> Option<&str> { self.parent_id.as_deref() }

    pub fn rename(&mut self, name: &str) -> Result<(), CategoryError> {
        let slug = slugify(name);
        if slug.is_empty() { return Err(CategoryError::MissingName); }
        self.name = name.trim().to_string();
        self.slug = slug;
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) { self.description = description; }

    /// True when `key` is this category's id or slug.
    pub fn matches(&self, key: &str) -> bool { self.id == key || self.slug.eq_ignore_ascii_case(key) }
}

/// Lowercases and joins alphanumeric runs with single dashes.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CategoryError {
    #[error("Missing name")]
    MissingName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Smart Phones"), "smart-phones");
        assert_eq!(slugify("  Audio & Headphones "), "audio-headphones");
        assert_eq!(slugify("!!"), "");
    }

    #[test]
    fn test_create_and_rename() {
        let mut c = Category::create("Laptops", None, None).unwrap();
        assert!(c.matches("laptops"));
        assert!(c.matches(&c.id().to_string()));
        c.rename("Gaming Laptops").unwrap();
        assert_eq!(c.slug(), "gaming-laptops");
        assert_eq!(c.rename(" "), Err(CategoryError::MissingName));
        assert!(Category::create("", None, None).is_err());
    }
}
