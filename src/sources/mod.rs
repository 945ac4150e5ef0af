pub mod traits;
pub mod rss_atom;
pub mod http;

pub use traits::{FeedParser, HttpResponse, HttpTransport, ParsedItem};
pub use rss_atom::FeedRsParser;
pub use http::ReqwestTransport;
