use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{BoothError, BoothResult};

/// A selectable character with one overlay image per cut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    pub thumbnail_url: String,
    pub overlay_images: [String; 4],
}

impl Character {
    pub fn overlay_url(&self, cut: usize) -> Option<&str> {
        self.overlay_images.get(cut).map(String::as_str)
    }
}

/// Characters shipped with the booth.
pub fn sample_characters() -> Vec<Character> {
    vec![
        Character {
            id: "char-1".into(),
            name: "Levi".into(),
            thumbnail_url: "/characters/levi.png".into(),
            overlay_images: [
                "/characters/levi.png".into(),
                "/characters/levi2.png".into(),
                "/characters/levi3.png".into(),
                "/characters/levi2.png".into(),
            ],
        },
        Character {
            id: "char-2".into(),
            name: "Cheerful Puppy".into(),
            thumbnail_url: "/characters/dog-overlay.svg".into(),
            overlay_images: std::array::from_fn(|_| "/characters/dog-overlay.svg".into()),
        },
        Character {
            id: "char-3".into(),
            name: "Mysterious Rabbit".into(),
            thumbnail_url: "/characters/rabbit-overlay.svg".into(),
            overlay_images: std::array::from_fn(|_| "/characters/rabbit-overlay.svg".into()),
        },
    ]
}

/// Reads a JSON array of characters.
pub fn load_catalog(path: impl AsRef<Path>) -> BoothResult<Vec<Character>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| BoothError::Catalog(format!("{}: {}", path.display(), e)))?;
    parse_catalog(&text)
}

pub fn parse_catalog(json: &str) -> BoothResult<Vec<Character>> {
    let characters: Vec<Character> =
        serde_json::from_str(json).map_err(|e| BoothError::Catalog(e.to_string()))?;
    if characters.is_empty() {
        return Err(BoothError::Catalog("catalog lists no characters".into()));
    }
    Ok(characters)
}

/// Looks a character up by id, falling back to a case-insensitive name match.
pub fn find_character<'a>(catalog: &'a [Character], key: &str) -> Option<&'a Character> {
    catalog
        .iter()
        .find(|c| c.id == key)
        .or_else(|| catalog.iter().find(|c| c.name.eq_ignore_ascii_case(key)))
}
