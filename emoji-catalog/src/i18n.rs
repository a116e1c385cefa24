//! Localized picker strings
//!
//! English ships with the crate; other locales are fetched as flat JSON files
//! with the same shape.

use serde::{Deserialize, Serialize};

use crate::interface::Locale;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct CategoryLabels {
    pub activity: String,
    pub custom: String,
    pub flags: String,
    pub foods: String,
    pub frequent: String,
    pub nature: String,
    pub objects: String,
    pub people: String,
    pub places: String,
    pub search: String,
    pub symbols: String,
}

impl CategoryLabels {
    /// Label for a bundle category id.
    pub fn get(&self, category_id: &str) -> Option<&str> {
        let label = match category_id {
            "activity" => &self.activity,
            "custom" => &self.custom,
            "flags" => &self.flags,
            "foods" => &self.foods,
            "frequent" => &self.frequent,
            "nature" => &self.nature,
            "objects" => &self.objects,
            "people" => &self.people,
            "places" => &self.places,
            "search" => &self.search,
            "symbols" => &self.symbols,
            _ => return None,
        };
        Some(label.as_str())
    }
}

/// Skin tone labels keyed `"1"`..`"6"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct SkinLabels {
    #[serde(rename = "1")]
    pub tone_1: String,
    #[serde(rename = "2")]
    pub tone_2: String,
    #[serde(rename = "3")]
    pub tone_3: String,
    #[serde(rename = "4")]
    pub tone_4: String,
    #[serde(rename = "5")]
    pub tone_5: String,
    #[serde(rename = "6")]
    pub tone_6: String,
    pub choose: String,
}

impl SkinLabels {
    /// Label for a 1-based tone.
    pub fn tone(&self, tone: u8) -> Option<&str> {
        let label = match tone {
            1 => &self.tone_1,
            2 => &self.tone_2,
            3 => &self.tone_3,
            4 => &self.tone_4,
            5 => &self.tone_5,
            6 => &self.tone_6,
            _ => return None,
        };
        Some(label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct Translations {
    pub search: String,
    pub search_no_results_1: String,
    pub search_no_results_2: String,
    pub pick: String,
    pub add_custom: String,
    pub categories: CategoryLabels,
    pub skins: SkinLabels,
}

impl Translations {
    /// Built-in English strings.
    pub fn english() -> Self {
        Self {
            search: "Search".to_string(),
            search_no_results_1: "Oh no!".to_string(),
            search_no_results_2: "That emoji couldn’t be found".to_string(),
            pick: "Pick an emoji…".to_string(),
            add_custom: "Add custom emoji".to_string(),
            categories: CategoryLabels {
                activity: "Activity".to_string(),
                custom: "Custom".to_string(),
                flags: "Flags".to_string(),
                foods: "Food & Drink".to_string(),
                frequent: "Frequently used".to_string(),
                nature: "Animals & Nature".to_string(),
                objects: "Objects".to_string(),
                people: "Smileys & People".to_string(),
                places: "Travel & Places".to_string(),
                search: "Search Results".to_string(),
                symbols: "Symbols".to_string(),
            },
            skins: SkinLabels {
                tone_1: "Default".to_string(),
                tone_2: "Light".to_string(),
                tone_3: "Medium-Light".to_string(),
                tone_4: "Medium".to_string(),
                tone_5: "Medium-Dark".to_string(),
                tone_6: "Dark".to_string(),
                choose: "Choose default skin tone".to_string(),
            },
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for Translations {
    fn default() -> Self {
        Self::english()
    }
}

/// Whether strings for `locale` must be fetched.
pub fn needs_fetch(locale: Locale) -> bool {
    locale != Locale::En
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRENCH: &str = r#"{
        "search": "Recherche",
        "search_no_results_1": "Oh non !",
        "search_no_results_2": "Cet emoji n’a pas été trouvé",
        "pick": "Choisissez un emoji…",
        "add_custom": "Ajouter un emoji personnalisé",
        "categories": {
            "activity": "Activités",
            "custom": "Personnalisés",
            "flags": "Drapeaux",
            "foods": "Nourriture & Boissons",
            "frequent": "Fréquemment utilisés",
            "nature": "Animaux & Nature",
            "objects": "Objets",
            "people": "Smileys & Personnes",
            "places": "Voyages & Lieux",
            "search": "Résultats de recherche",
            "symbols": "Symboles"
        },
        "skins": {
            "1": "Par défaut",
            "2": "Clair",
            "3": "Moyennement clair",
            "4": "Moyen",
            "5": "Moyennement foncé",
            "6": "Foncé",
            "choose": "Choisir le ton de peau par défaut"
        }
    }"#;

    #[test]
    fn test_parse_locale_file() {
        let t = Translations::from_json(FRENCH).unwrap();
        assert_eq!(t.categories.get("flags"), Some("Drapeaux"));
        assert_eq!(t.skins.tone(6), Some("Foncé"));
        assert_eq!(t.skins.tone(7), None);
    }

    #[test]
    fn test_english_wire_shape() {
        let value = serde_json::to_value(Translations::english()).unwrap();
        assert_eq!(value["skins"]["1"], "Default");
        assert_eq!(value["categories"]["frequent"], "Frequently used");
        assert!(value["skins"].get("tone_1").is_none());
    }

    #[test]
    fn test_missing_key_is_parse_error() {
        assert!(Translations::from_json(r#"{"search":"Search"}"#).is_err());
    }

    #[test]
    fn test_only_english_is_builtin() {
        assert!(!needs_fetch(Locale::En));
        assert!(needs_fetch(Locale::Fr));
    }
}
