#![allow(missing_docs)]

//! Shared domain models decoded from the games catalog.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Catalog identifier of a game.
pub type GameId = u64;

/// Genre tag attached to a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

/// Platform record (PC, PlayStation 5, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: u64,
    pub name: String,
}

/// Wrapper the catalog uses around each platform of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEntry {
    pub platform: Platform,
    #[serde(default)]
    pub released_at: Option<String>,
}

/// Developer or publisher credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: u64,
    pub name: String,
}

/// Screenshot reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    #[serde(default)]
    pub id: i64,
    pub image: String,
}

/// Game as it appears in list and search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: GameId,
    pub name: String,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Average rating on a 0-5 scale.
    #[serde(default)]
    pub rating: Option<f32>,
}

impl GameSummary {
    /// Comma separated genre names, limited to `max` entries.
    pub fn genre_label(&self, max: usize) -> String {
        self.genres
            .iter()
            .take(max)
            .map(|genre| genre.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Rating with one decimal, if the catalog reported one.
    pub fn rating_label(&self) -> Option<String> {
        self.rating
            .filter(|rating| *rating > 0.0)
            .map(|rating| format!("{rating:.1}"))
    }
}

/// Full record for a single game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDetail {
    #[serde(flatten)]
    pub summary: GameSummary,
    /// Plain-text description.
    #[serde(default, rename = "description_raw")]
    pub description: String,
    #[serde(default)]
    pub released: Option<NaiveDate>,
    #[serde(default)]
    pub platforms: Vec<PlatformEntry>,
    #[serde(default)]
    pub developers: Vec<Company>,
    #[serde(default)]
    pub publishers: Vec<Company>,
    #[serde(default, rename = "short_screenshots")]
    pub screenshots: Vec<Screenshot>,
    #[serde(default)]
    pub ratings_count: u64,
}

impl GameDetail {
    pub fn id(&self) -> GameId {
        self.summary.id
    }

    pub fn name(&self) -> &str {
        &self.summary.name
    }

    /// Screenshot image URLs in catalog order.
    pub fn screenshot_urls(&self) -> Vec<&str> {
        self.screenshots
            .iter()
            .map(|shot| shot.image.as_str())
            .collect()
    }

    /// Platform names in catalog order.
    pub fn platform_names(&self) -> Vec<&str> {
        self.platforms
            .iter()
            .map(|entry| entry.platform.name.as_str())
            .collect()
    }
}

/// One page of a paginated catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// Page of game summaries returned by list and search queries.
pub type GamePage = Page<GameSummary>;

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_BODY: &str = r#"{
        "count": 2,
        "next": "https://api.rawg.io/api/games?page=2",
        "previous": null,
        "results": [
            {
                "id": 3498,
                "name": "Grand Theft Auto V",
                "background_image": "https://media.rawg.io/gta.jpg",
                "rating": 4.47,
                "genres": [{"id": 4, "name": "Action", "slug": "action"}]
            },
            {
                "id": 1,
                "name": "Unrated",
                "background_image": null,
                "rating": 0
            }
        ]
    }"#;

    const DETAIL_BODY: &str = r#"{
        "id": 3498,
        "name": "Grand Theft Auto V",
        "description": "<p>Rockstar</p>",
        "description_raw": "Rockstar",
        "released": "2013-09-17",
        "background_image": "https://media.rawg.io/gta.jpg",
        "rating": 4.47,
        "ratings_count": 6500,
        "genres": [{"id": 4, "name": "Action"}, {"id": 3, "name": "Adventure"}],
        "platforms": [
            {"platform": {"id": 4, "name": "PC"}, "released_at": "2013-09-17"},
            {"platform": {"id": 187, "name": "PlayStation 5"}}
        ],
        "developers": [{"id": 3524, "name": "Rockstar North"}],
        "publishers": [{"id": 2155, "name": "Rockstar Games"}],
        "short_screenshots": [
            {"id": -1, "image": "https://media.rawg.io/a.jpg"},
            {"id": 1827221, "image": "https://media.rawg.io/b.jpg"}
        ]
    }"#;

    #[test]
    fn decodes_list_page() {
        let page: GamePage = serde_json::from_str(LIST_BODY).unwrap();
        assert_eq!(page.count, 2);
        assert!(page.has_next());
        assert!(!page.has_previous());
        assert_eq!(page.results.len(), 2);

        let gta = &page.results[0];
        assert_eq!(gta.genre_label(2), "Action");
        assert_eq!(gta.rating_label().as_deref(), Some("4.5"));

        let unrated = &page.results[1];
        assert!(unrated.background_image.is_none());
        assert!(unrated.genres.is_empty());
        assert_eq!(unrated.rating_label(), None);
    }

    #[test]
    fn decodes_detail_as_superset_of_summary() {
        let detail: GameDetail = serde_json::from_str(DETAIL_BODY).unwrap();
        assert_eq!(detail.id(), 3498);
        assert_eq!(detail.name(), "Grand Theft Auto V");
        assert_eq!(detail.description, "Rockstar");
        assert_eq!(detail.released, NaiveDate::from_ymd_opt(2013, 9, 17));
        assert_eq!(detail.platform_names(), vec!["PC", "PlayStation 5"]);
        assert_eq!(detail.developers[0].name, "Rockstar North");
        assert_eq!(detail.publishers[0].name, "Rockstar Games");
        assert_eq!(
            detail.screenshot_urls(),
            vec!["https://media.rawg.io/a.jpg", "https://media.rawg.io/b.jpg"]
        );
        assert_eq!(detail.ratings_count, 6500);
        assert_eq!(detail.summary.genre_label(1), "Action");
    }

    #[test]
    fn detail_tolerates_missing_optional_fields() {
        let detail: GameDetail =
            serde_json::from_str(r#"{"id": 7, "name": "Bare", "released": null}"#).unwrap();
        assert_eq!(detail.id(), 7);
        assert!(detail.released.is_none());
        assert!(detail.description.is_empty());
        assert!(detail.platforms.is_empty());
        assert_eq!(detail.ratings_count, 0);
    }
}
