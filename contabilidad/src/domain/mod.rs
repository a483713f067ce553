mod movement;
mod recurring;
mod tag;

pub use movement::*;
pub use recurring::*;
pub use tag::*;
