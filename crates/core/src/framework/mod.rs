//! The AET progression framework: a fixed, versioned tree of
//! areas → categories → subcategories.
//!
//! The tree is `'static` data compiled into the binary; nothing mutates it at
//! runtime. Progress records refer to it through [`SubcategoryId`], which can
//! only be constructed for ids that exist in the tree.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

mod data;

pub use data::FRAMEWORK_VERSION;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FrameworkError {
    #[error("unknown framework subcategory: {0}")]
    UnknownSubcategory(String),
}

//
// ─── TREE TYPES ────────────────────────────────────────────────────────────────
//

/// Top-level framework area, e.g. "Communication and Interaction".
#[derive(Debug, Serialize)]
pub struct Area {
    pub id: &'static str,
    pub number: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub categories: &'static [Category],
}

#[derive(Debug, Serialize)]
pub struct Category {
    pub id: &'static str,
    /// Sequential within the owning area, starting at 1.
    pub number: u8,
    pub name: &'static str,
    pub subcategories: &'static [Subcategory],
}

/// The atomic unit of progression tracking.
#[derive(Debug, Serialize)]
pub struct Subcategory {
    pub id: &'static str,
    /// `"{category}.{n}"`, unique within the area.
    pub code: &'static str,
    pub name: &'static str,
}

impl Area {
    #[must_use]
    pub fn subcategory_count(&self) -> usize {
        self.categories.iter().map(|c| c.subcategories.len()).sum()
    }

    /// Subcategories of this area in tree order.
    pub fn subcategories(&'static self) -> impl Iterator<Item = SubcategoryPath> {
        let area = self;
        area.categories.iter().flat_map(move |category| {
            category
                .subcategories
                .iter()
                .map(move |subcategory| SubcategoryPath {
                    area,
                    category,
                    subcategory,
                })
        })
    }
}

/// Location of a subcategory in the tree.
#[derive(Debug, Clone, Copy)]
pub struct SubcategoryPath {
    pub area: &'static Area,
    pub category: &'static Category,
    pub subcategory: &'static Subcategory,
}

impl SubcategoryPath {
    #[must_use]
    pub fn id(&self) -> SubcategoryId {
        SubcategoryId(self.subcategory.id.to_string())
    }

    /// Human-readable breadcrumb, e.g. `"Communication and Interaction › Receptive communication › 2.3 Understanding questions"`.
    #[must_use]
    pub fn breadcrumb(&self) -> String {
        format!(
            "{} › {} › {} {}",
            self.area.name, self.category.name, self.subcategory.code, self.subcategory.name
        )
    }
}

impl Serialize for SubcategoryPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("SubcategoryPath", 8)?;
        state.serialize_field("id", self.subcategory.id)?;
        state.serialize_field("code", self.subcategory.code)?;
        state.serialize_field("name", self.subcategory.name)?;
        state.serialize_field("area_id", self.area.id)?;
        state.serialize_field("area_name", self.area.name)?;
        state.serialize_field("area_color", self.area.color)?;
        state.serialize_field("category_id", self.category.id)?;
        state.serialize_field("category_name", self.category.name)?;
        state.end()
    }
}

//
// ─── SUBCATEGORY ID ────────────────────────────────────────────────────────────
//

/// Stable reference to a framework subcategory.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubcategoryId(String);

impl SubcategoryId {
    /// Validate a raw id against the framework.
    ///
    /// # Errors
    ///
    /// Returns `FrameworkError::UnknownSubcategory` if no subcategory has this id.
    pub fn parse(raw: &str) -> Result<Self, FrameworkError> {
        let trimmed = raw.trim();
        find_subcategory(trimmed)
            .map(|sub| Self(sub.id.to_string()))
            .ok_or_else(|| FrameworkError::UnknownSubcategory(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tree location of this id. Always present for a parsed id.
    #[must_use]
    pub fn path(&self) -> Option<SubcategoryPath> {
        subcategory_path(&self.0)
    }
}

impl fmt::Debug for SubcategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubcategoryId({})", self.0)
    }
}

impl fmt::Display for SubcategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SubcategoryId {
    type Err = FrameworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SubcategoryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SubcategoryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

//
// ─── TRAVERSAL ─────────────────────────────────────────────────────────────────
//

/// All areas in framework order.
#[must_use]
pub fn areas() -> &'static [Area] {
    data::AREAS
}

#[must_use]
pub fn find_area(id: &str) -> Option<&'static Area> {
    data::AREAS.iter().find(|area| area.id == id)
}

#[must_use]
pub fn find_category(id: &str) -> Option<&'static Category> {
    data::AREAS
        .iter()
        .flat_map(|area| area.categories.iter())
        .find(|category| category.id == id)
}

#[must_use]
pub fn find_subcategory(id: &str) -> Option<&'static Subcategory> {
    subcategory_path(id).map(|path| path.subcategory)
}

#[must_use]
pub fn subcategory_path(id: &str) -> Option<SubcategoryPath> {
    subcategories().find(|path| path.subcategory.id == id)
}

/// Every subcategory in tree order, with its location.
pub fn subcategories() -> impl Iterator<Item = SubcategoryPath> {
    data::AREAS.iter().flat_map(|area| {
        area.categories.iter().flat_map(move |category| {
            category
                .subcategories
                .iter()
                .map(move |subcategory| SubcategoryPath {
                    area,
                    category,
                    subcategory,
                })
        })
    })
}

#[must_use]
pub fn subcategory_count() -> usize {
    data::AREAS.iter().map(Area::subcategory_count).sum()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
