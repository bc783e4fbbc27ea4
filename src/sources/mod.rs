pub mod http;
pub mod registry;
pub mod relay;
pub mod traits;

pub use http::HttpTransport;
pub use registry::FeedRegistry;
pub use traits::Transport;
