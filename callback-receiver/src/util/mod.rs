//! Small shared helpers.

pub mod clock;

pub use clock::unix_now;
