mod client;
mod error;
mod hall;
mod xml;

pub use client::*;
pub use error::*;
pub use hall::*;
pub use xml::*;
