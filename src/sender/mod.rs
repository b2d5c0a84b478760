//! Remote HTTP sink: client construction, single-record delivery and counters.

pub mod client;
pub mod remote;
pub mod stats;

pub use client::{ClientConfig, ClientError, build_client};
pub use remote::{DeliveryError, DeliveryReceipt, PendingDelivery, RemoteSink, RemoteTarget};
pub use stats::{DeliveryStats, DeliveryStatsSnapshot};
