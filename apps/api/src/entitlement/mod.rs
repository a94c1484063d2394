//! Entitlement gate — the paywall in front of generation.
//!
//! A grant is written when the user reports a completed checkout and is
//! trusted as-is: there is no receipt verification. It is valid while
//! `is_paid && now < expires_at`. Anything else found in storage is cleared
//! the next time the gate is consulted.

pub mod handlers;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::storage::{read_json, write_json, KvStore, StorageError, ENTITLEMENT_KEY};

/// Persisted payment grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementGrant {
    pub is_paid: bool,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub issued_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl EntitlementGrant {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_paid && now < self.expires_at
    }
}

/// Result of consulting the gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitlementStatus {
    pub valid: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct EntitlementGate {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    validity: Duration,
}

impl EntitlementGate {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, validity: Duration) -> Self {
        Self {
            store,
            clock,
            validity,
        }
    }

    /// True only if an unexpired paid grant is stored.
    pub fn check_status(&self) -> bool {
        self.status().valid
    }

    /// Like [`check_status`](Self::check_status) but also reports the expiry.
    /// Expired or unpaid grants are removed as a side effect.
    pub fn status(&self) -> EntitlementStatus {
        let Some(grant) = read_json::<EntitlementGrant>(self.store.as_ref(), ENTITLEMENT_KEY)
        else {
            return EntitlementStatus {
                valid: false,
                expires_at: None,
            };
        };

        if grant.is_valid_at(self.clock.now()) {
            return EntitlementStatus {
                valid: true,
                expires_at: Some(grant.expires_at),
            };
        }

        info!("Entitlement expired at {}, clearing", grant.expires_at);
        if let Err(e) = self.store.remove(ENTITLEMENT_KEY) {
            warn!("Failed to clear expired entitlement: {e}");
        }
        EntitlementStatus {
            valid: false,
            expires_at: None,
        }
    }

    /// Records a fresh grant, replacing any existing one.
    pub fn grant(&self) -> Result<EntitlementGrant, StorageError> {
        let now = self.clock.now();
        let grant = EntitlementGrant {
            is_paid: true,
            issued_at: now,
            expires_at: now
                .checked_add_signed(self.validity)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        write_json(self.store.as_ref(), ENTITLEMENT_KEY, &grant)?;
        info!("Entitlement granted until {}", grant.expires_at);
        Ok(grant)
    }

    pub fn revoke(&self) -> Result<(), StorageError> {
        self.store.remove(ENTITLEMENT_KEY)?;
        info!("Entitlement revoked");
        Ok(())
    }
}
