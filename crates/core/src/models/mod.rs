//! Data models for Rollcall

mod attendance;
mod course;
mod event;
mod hall;
mod participant;
mod profile;
mod registration;

pub use attendance::*;
pub use course::*;
pub use event::*;
pub use hall::*;
pub use participant::*;
pub use profile::*;
pub use registration::*;
