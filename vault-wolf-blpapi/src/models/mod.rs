//! Bloomberg API data structures.

pub mod element;
pub mod enums;
pub mod response;
pub mod value;
