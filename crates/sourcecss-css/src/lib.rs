//! Class tuples and the CSS tidy pass for generated stylesheets.
//!
//! Style values returned by a library are classified as [`StyleDescriptor`]s,
//! folded into named [`ClassTuple`]s, concatenated by [`assemble`] and turned
//! into a flat, de-duplicated, formatted stylesheet by [`tidy`].

pub mod descriptor;
pub mod tidy;
pub mod tuple;

pub use descriptor::StyleDescriptor;
pub use tidy::{assemble, tidy, TidyError, TidyOptions};
pub use tuple::{class_tuple, combinator_tuple, ClassTuple, CLASS_PREFIX};
