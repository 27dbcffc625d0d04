//! Component definitions for the object registry.
//!
//! Components are plain data attached to registry entities. Which optional
//! components an object carries (brain, automaton, links) follows from the
//! capability set resolved once from its type at creation.

mod automat;
mod brain;
mod links;
mod object;

pub use automat::*;
pub use brain::*;
pub use links::*;
pub use object::*;
