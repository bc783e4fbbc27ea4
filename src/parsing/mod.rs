pub mod categorizer;
pub mod date;
pub mod feed_parser;
pub mod image;
pub mod markup;

pub use categorizer::categorize;
pub use date::{parse_date, parse_date_or, try_parse_date};
pub use feed_parser::{parse_feed, parse_feed_at};
pub use image::{resolve_image, MediaRef};
