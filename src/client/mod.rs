pub mod http;
pub mod recording;
pub mod traits;

pub use http::*;
pub use recording::*;
pub use traits::*;
