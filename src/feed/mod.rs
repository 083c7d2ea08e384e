//! Feed items: statement construction, rendering, the service and its routes.

pub mod model;
pub mod query;
pub mod render;
pub mod routes;
pub mod service;

pub use model::{FeedFilter, FeedItem, NewPost};
pub use routes::feed_routes;
pub use service::{FeedService, ListView, RequestContext};
