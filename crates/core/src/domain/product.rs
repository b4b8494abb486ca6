use serde::{Deserialize, Serialize};

/// Closed furniture taxonomy. Nouns outside this set are never classified;
/// the matcher simply ignores them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Chair,
    Desk,
    Counter,
    Lamp,
    Stool,
    Locker,
    Armoire,
    Shelf,
    Sofa,
    FilingCabinet,
    Whiteboard,
    CoatRack,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chair => "chair",
            Self::Desk => "desk",
            Self::Counter => "counter",
            Self::Lamp => "lamp",
            Self::Stool => "stool",
            Self::Locker => "locker",
            Self::Armoire => "armoire",
            Self::Shelf => "shelf",
            Self::Sofa => "sofa",
            Self::FilingCabinet => "filing_cabinet",
            Self::Whiteboard => "whiteboard",
            Self::CoatRack => "coat_rack",
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes harvested from the whole message, not just the matched span.
/// List-valued fields stay lists in memory; they collapse to comma-joined
/// strings only at the persistence boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttributes {
    pub material: Vec<String>,
    pub style: Vec<String>,
    pub brand: Option<String>,
    pub features: Vec<String>,
}

/// A category noun found in one message, with its surrounding context
/// snippet for later description generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedProduct {
    pub category: ProductCategory,
    pub display_name: String,
    pub attributes: ProductAttributes,
    pub context: String,
}
