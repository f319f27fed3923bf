pub mod baseline;
pub mod member;
pub mod survey;

pub use baseline::*;
pub use member::*;
pub use survey::*;
