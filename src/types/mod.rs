mod datetime;
pub use datetime::*;
mod duration;
pub use duration::*;
mod text;
pub use text::*;
mod timezone;
pub use timezone::*;
