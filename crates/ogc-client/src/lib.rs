//! Async WMS and WFS clients.
//!
//! This crate wires the pure protocol logic of `ogc-protocol` to a
//! [`Transport`]:
//! - [`WfsClient`]: capabilities, schemas, paged and spatial feature reads, transactions
//! - [`WmsClient`]: capabilities, styles, GetFeatureInfo, legend URLs
//! - [`LayerStore`]: an ordered layer tree with change notifications
//!
//! Every call returns `Result<T, OgcError>` and shares no state with other
//! calls, so requests may run concurrently.

pub mod config;
pub mod store;
pub mod transport;
pub mod wfs;
pub mod wms;

pub use config::ClientConfig;
pub use store::{LayerStore, StoreEvent};
pub use transport::{HttpTransport, RawResponse, Transport};
pub use wfs::WfsClient;
pub use wms::WmsClient;
