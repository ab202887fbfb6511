//! Tenant domain model.
//!
//! A tenant is one agency account: the unit of data isolation and billing.
//! Tenants are the root of the isolation boundary and are not themselves
//! tenant-scoped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription status of a tenant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantStatus {
    Active,
    Suspended,
    Trial,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Suspended => "Suspended",
            Self::Trial => "Trial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Active" => Some(Self::Active),
            "Suspended" => Some(Self::Suspended),
            "Trial" => Some(Self::Trial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Agency display name.
    pub name: String,
    /// Company registration number, if known.
    pub document: Option<String>,
    pub status: TenantStatus,
    /// End of the paid (or trial) period. `None` means open-ended.
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Whether the tenant may use the platform at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        if self.status == TenantStatus::Suspended {
            return false;
        }
        self.subscription_expires_at.is_none_or(|expires| expires > now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub document: Option<String>,
    /// Defaults to `Trial` when not given.
    pub status: Option<TenantStatus>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tenant(status: TenantStatus, expires: Option<DateTime<Utc>>) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            name: "Agency".into(),
            document: None,
            status,
            subscription_expires_at: expires,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn suspended_tenant_is_unusable() {
        assert!(!tenant(TenantStatus::Suspended, None).is_usable_at(Utc::now()));
    }

    #[test]
    fn expired_subscription_is_unusable() {
        let now = Utc::now();
        let t = tenant(TenantStatus::Active, Some(now - Duration::days(1)));
        assert!(!t.is_usable_at(now));
        let t = tenant(TenantStatus::Trial, Some(now + Duration::days(1)));
        assert!(t.is_usable_at(now));
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for s in [TenantStatus::Active, TenantStatus::Suspended, TenantStatus::Trial] {
            assert_eq!(TenantStatus::parse(s.as_str()), Some(s));
        }
    }
}
