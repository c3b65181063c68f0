use std::collections::HashSet;

use shared::domain::Theme;

use crate::error::ComicError;

const CAT_THEMES: [&str; 30] = [
    "trying to get its human's attention while they work",
    "encountering a cucumber for the first time",
    "the epic saga of chasing the red dot",
    "attempting to 'help' with household chores",
    "discovering its own reflection in a mirror",
    "the strategic mission to steal a piece of chicken",
    "trying to fit into a box that is clearly too small",
    "the intense negotiation for more food right after being fed",
    "waking up its human for breakfast at 5 AM",
    "a dramatic reaction to seeing the bottom of the food bowl",
    "the cat versus a houseplant",
    "a failed attempt at a graceful leap",
    "finding the warmest, most inconvenient place to nap",
    "investigating a mysterious noise",
    "trying to catch a sunbeam that keeps moving",
    "the challenge of a closed door",
    "unraveling a roll of toilet paper with great joy",
    "interacting with a robot vacuum cleaner",
    "being introduced to a new kitten",
    "the cat's internal monologue during a vet visit",
    "trying to operate a human object, like a TV remote",
    "a cat's elaborate plan to get the best spot on the sofa",
    "experiencing catnip for the first time",
    "the silent judgment of its human's life choices",
    "hiding from a bath",
    "the quest to capture a single fly buzzing in the room",
    "a cat discovering its love for an empty cardboard box",
    "trying to understand why the human is singing",
    "a staring contest with a garden gnome",
    "the drama of a slightly moved piece of furniture",
];

/// Fixed, ordered list of distinct themes. A theme's identity is its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeCatalog {
    themes: Vec<Theme>,
}

impl ThemeCatalog {
    pub fn new<I, S>(entries: I) -> Result<Self, ComicError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut themes = Vec::new();
        for entry in entries {
            let entry: String = entry.into();
            let entry = entry.trim();
            if entry.is_empty() {
                return Err(ComicError::Configuration(
                    "theme catalog contains a blank entry".into(),
                ));
            }
            if !seen.insert(entry.to_string()) {
                return Err(ComicError::Configuration(format!(
                    "theme catalog contains duplicate entry '{entry}'"
                )));
            }
            themes.push(Theme::new(entry));
        }
        if themes.is_empty() {
            return Err(ComicError::Configuration("theme catalog is empty".into()));
        }
        Ok(Self { themes })
    }

    /// The built-in cat catalog.
    pub fn cats() -> Self {
        Self {
            themes: CAT_THEMES.iter().copied().map(Theme::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Theme> {
        self.themes.get(index)
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Theme> {
        self.themes.iter()
    }
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        Self::cats()
    }
}
