pub mod block_upload;
pub mod creation;
pub mod progress;
pub mod recipes;

pub use creation::*;
pub use progress::*;
pub use recipes::*;
