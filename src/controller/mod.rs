//! Controller implementations for the Camunda CRDs
//!
//! Each kind gets its own watch-driven reconciliation loop. The loops share
//! a connector (and through it one token provider), so ticks for different
//! records authenticate once per token lifetime, not once per tick.

mod client;
mod cluster;

pub use client::{
    error_policy as client_error_policy, reconcile as client_reconcile, ClientContext,
    ClientRecords, ClientRecordsImpl, CLIENT_FINALIZER,
};
pub use cluster::{
    error_policy, reconcile, ClusterRecords, ClusterRecordsImpl, Context, CLUSTER_FINALIZER,
};
