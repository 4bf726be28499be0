#![forbid(unsafe_code)]

pub mod framework;
pub mod links;
pub mod model;
pub mod progression;
pub mod prompt;
pub mod summary;
pub mod time;

pub use framework::{Area, Category, FrameworkError, Subcategory, SubcategoryId, SubcategoryPath};
pub use progression::{ProgressionLevel, ProgressionLevelError};
pub use time::Clock;
