//! # courier-shared
//!
//! Wire protocol types and media payload handling shared between the
//! courier relay server and its clients.  No I/O lives here; everything is
//! plain data plus a few pure helpers.

pub mod identity;
pub mod media;
pub mod protocol;

pub use identity::Username;
