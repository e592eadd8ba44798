//! Protocol types for the DFP SOAP client.
//!
//! This crate holds everything that does not need a network connection and is
//! shared between the client and its tests:
//!
//! ## Modules
//!
//! - [`element`]: a small XML element tree used for weakly typed SOAP payloads
//! - [`value`]: the tagged values carried by bind variables and PQL rows
//! - [`statement`]: filter statements and the statement builder
//! - [`pql`]: PQL result sets and their conversion to text cells
//! - [`envelope`]: SOAP 1.1 request encoding and response decoding
//! - [`compression`]: HTTP body compression
//! - [`error`]: error types for all of the above

mod compression;
mod element;
mod envelope;
mod error;
mod pql;
mod statement;
mod value;

pub use compression::*;
pub use element::*;
pub use envelope::*;
pub use error::*;
pub use pql::*;
pub use statement::*;
pub use value::*;
