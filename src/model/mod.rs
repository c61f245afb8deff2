pub mod block;
pub mod common;
pub mod element;
pub mod flow;
pub mod options;
pub mod question;
pub mod question_js;
pub mod survey;

pub use block::*;
pub use common::*;
pub use element::*;
pub use flow::*;
pub use options::*;
pub use question::*;
pub use question_js::*;
pub use survey::*;
