pub mod decorators;
pub mod views;

pub use decorators::*;
pub use views::*;
