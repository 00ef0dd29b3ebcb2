//! Marker styling keyed by monument category
//!
//! Catalogue category tags are free text. They are mapped onto a closed
//! [`Category`] through a keyword table; anything unmatched becomes
//! [`Category::Other`].

use serde::{Deserialize, Serialize};

/// Closed set of categories the renderer knows how to style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Religious,
    Civil,
    Military,
    Archaeological,
    Industrial,
    Ethnographic,
    Other,
}

/// Keyword fragments (lower case) and the category they select, checked in order
const CATEGORY_KEYWORDS: &[(&str, Category)] = &[
    ("religios", Category::Religious),
    ("iglesia", Category::Religious),
    ("ermita", Category::Religious),
    ("catedral", Category::Religious),
    ("monasterio", Category::Religious),
    ("militar", Category::Military),
    ("castillo", Category::Military),
    ("muralla", Category::Military),
    ("torre", Category::Military),
    ("arqueol", Category::Archaeological),
    ("yacimiento", Category::Archaeological),
    ("industrial", Category::Industrial),
    ("etnogr", Category::Ethnographic),
    ("etnol", Category::Ethnographic),
    ("civil", Category::Civil),
    ("palacio", Category::Civil),
    ("puente", Category::Civil),
];

/// Visual style handed to the marker rendering capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    /// Fill colour as a CSS hex string
    pub color: &'static str,
    /// Short glyph name understood by the renderer's icon set
    pub glyph: &'static str,
}

impl Category {
    /// Map a free-text category tag onto a category
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .find(|(keyword, _)| tag.contains(keyword))
            .map_or(Category::Other, |(_, category)| *category)
    }

    pub fn style(self) -> MarkerStyle {
        match self {
            Self::Religious => MarkerStyle {
                color: "#8e44ad",
                glyph: "church",
            },
            Self::Civil => MarkerStyle {
                color: "#2980b9",
                glyph: "building",
            },
            Self::Military => MarkerStyle {
                color: "#c0392b",
                glyph: "castle",
            },
            Self::Archaeological => MarkerStyle {
                color: "#d35400",
                glyph: "amphora",
            },
            Self::Industrial => MarkerStyle {
                color: "#7f8c8d",
                glyph: "factory",
            },
            Self::Ethnographic => MarkerStyle {
                color: "#27ae60",
                glyph: "mill",
            },
            Self::Other => MarkerStyle {
                color: "#34495e",
                glyph: "pin",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_keywords() {
        assert_eq!(
            Category::from_tag("Arquitectura religiosa"),
            Category::Religious
        );
        assert_eq!(Category::from_tag("Castillo"), Category::Military);
        assert_eq!(
            Category::from_tag("Yacimiento ARQUEOLÓGICO"),
            Category::Archaeological
        );
        assert_eq!(
            Category::from_tag("Patrimonio industrial"),
            Category::Industrial
        );
        assert_eq!(Category::from_tag("Arquitectura civil"), Category::Civil);
    }

    #[test]
    fn test_unknown_tag_falls_back_to_other() {
        assert_eq!(Category::from_tag(""), Category::Other);
        assert_eq!(Category::from_tag("Fuente"), Category::Other);
    }

    #[test]
    fn test_every_category_has_distinct_color() {
        let all = [
            Category::Religious,
            Category::Civil,
            Category::Military,
            Category::Archaeological,
            Category::Industrial,
            Category::Ethnographic,
            Category::Other,
        ];
        let colors: std::collections::HashSet<_> = all.iter().map(|c| c.style().color).collect();
        assert_eq!(colors.len(), all.len());
    }
}
