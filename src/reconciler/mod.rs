//! The Observe/Create/Update/Delete contract over external resources
//!
//! One [`ExternalResource`] implementation exists per managed kind, selected
//! statically by the controller that owns the kind. The reconcilers are pure
//! functions of (record, remote state): they hold no state across ticks and
//! never touch the store themselves; the controller persists whatever an
//! operation reports back.

mod client;
mod cluster;

pub use client::ClientExternal;
pub use cluster::ClusterExternal;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::crd::Availability;
use crate::Error;

/// Connection details handed to the secret publisher
///
/// String keys mapping to byte values; write-only from the reconciler's
/// perspective.
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

/// Result of comparing desired state to remote reality in one tick
#[derive(Debug)]
pub struct Observation<O> {
    /// Whether the external resource exists
    ///
    /// False either because the record carries no external identifier yet or
    /// because the console reported a structured not-found.
    pub exists: bool,

    /// Whether the remote resource matches the desired spec
    pub up_to_date: bool,

    /// Projected availability; None when the resource does not exist
    pub availability: Option<Availability>,

    /// Connection details extracted from the observed resource
    pub connection_details: ConnectionDetails,

    /// Kind-specific observation block to mirror onto the record's status
    pub observed: Option<O>,
}

impl<O> Observation<O> {
    /// Observation of an absent resource: the "needs creation" signal
    pub fn absent() -> Self {
        Self {
            exists: false,
            up_to_date: false,
            availability: None,
            connection_details: ConnectionDetails::new(),
            observed: None,
        }
    }
}

/// Result of creating an external resource
#[derive(Debug)]
pub struct Creation {
    /// Identifier assigned by the remote system
    ///
    /// Must be persisted onto the record before the tick ends; it is the
    /// only thing standing between the next tick and a duplicate creation.
    pub external_id: String,

    /// Secrets returned only at creation time, never retrievable again
    pub connection_details: ConnectionDetails,
}

/// Result of updating an external resource
#[derive(Debug, Default)]
pub struct Update {
    /// Connection details produced by the update, if any
    pub connection_details: ConnectionDetails,
}

/// The reconciliation contract between a desired-state record and its
/// external counterpart
///
/// The scheduler-facing flow is: `observe`; if absent, `create`; if present
/// but drifted, `update`; on deletion request, `delete`. Every method is
/// re-entrant and must tolerate being called again after partial failure.
#[async_trait]
pub trait ExternalResource {
    /// Kind-specific desired-state record
    type Record: Send + Sync;

    /// Kind-specific observation block mirrored onto the record's status
    type Observed: Send;

    /// Compare desired state against remote reality
    ///
    /// A structured not-found (or a record with no external identifier) is
    /// reported as `exists=false`, never as an error; any other remote
    /// failure surfaces.
    async fn observe(&self, record: &Self::Record)
        -> Result<Observation<Self::Observed>, Error>;

    /// Create the external resource from the record's spec
    async fn create(&self, record: &Self::Record) -> Result<Creation, Error>;

    /// Reconcile remote state with a drifted spec
    async fn update(&self, record: &Self::Record) -> Result<Update, Error>;

    /// Delete the external resource; deleting an already-gone resource
    /// succeeds
    async fn delete(&self, record: &Self::Record) -> Result<(), Error>;
}
