//! Catalogue REST API access
//!
//! [`HttpTransport`] is the seam between the client and the network; tests swap
//! in an in-memory transport and production uses [`ReqwestTransport`].

mod client;
mod dto;
#[cfg(test)]
pub(crate) mod mock;
mod transport;

pub use client::{CatalogueClient, SearchPage, SpatialQueryClient};
pub use transport::{HttpTransport, ReqwestTransport};
