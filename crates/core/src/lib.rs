//! Domain types and pure logic for the portfolio service.
//!
//! - [`project`] -- project records, the portfolio document, form parsing.
//! - [`image`] -- image references, slots, and staged uploads.
//! - [`reconcile`] -- removal planning for image updates.
//! - [`naming`] -- path-segment rules for identifiers and filenames.

pub mod error;
pub mod image;
pub mod naming;
pub mod project;
pub mod reconcile;
