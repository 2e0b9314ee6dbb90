pub mod calls;
pub mod schema;
pub mod span;

pub use calls::*;
pub use schema::*;
pub use span::*;
