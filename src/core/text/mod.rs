// Text filters
pub mod encoding;
pub mod entities;
pub mod case;
pub mod html_entities;
pub mod strip_tags;

pub use case::{CaseOptions, StringToLower, StringToUpper, ToStringFilter};
pub use html_entities::{HtmlEntities, HtmlEntitiesOptions, QuoteStyle};
pub use strip_tags::{StripTags, StripTagsOptions};
