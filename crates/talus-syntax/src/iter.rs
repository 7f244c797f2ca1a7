pub mod chars;
pub mod peek2;

pub use chars::{Char, Chars};
pub use peek2::Peek2;
