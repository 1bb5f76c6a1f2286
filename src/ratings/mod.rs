//! The ratings feed: filter predicate, ordering, and the anchored page resolver.

mod filter;
mod model;
mod order;
mod pagination;
mod resolver;

pub use filter::RatingCriteria;
pub use model::{Rating, RatingPage, Role};
pub use pagination::PageRequest;
pub use resolver::Ratings;
