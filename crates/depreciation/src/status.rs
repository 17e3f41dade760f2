//! Asset lifecycle state machine and its append-only event record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use assetbook_core::{AssetId, DomainError, Entity, EventId, TenantId, TenantScoped, UserId};

/// Lifecycle status of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Available,
    Assigned,
    InRepair,
    Lost,
    Broken,
    Disposed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid status transition: {from} -> {to}")]
    Invalid { from: AssetStatus, to: AssetStatus },
}

impl From<TransitionError> for DomainError {
    fn from(value: TransitionError) -> Self {
        DomainError::validation(value.to_string())
    }
}

impl AssetStatus {
    pub const ALL: [AssetStatus; 6] = [
        AssetStatus::Available,
        AssetStatus::Assigned,
        AssetStatus::InRepair,
        AssetStatus::Lost,
        AssetStatus::Broken,
        AssetStatus::Disposed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Available => "available",
            AssetStatus::Assigned => "assigned",
            AssetStatus::InRepair => "in_repair",
            AssetStatus::Lost => "lost",
            AssetStatus::Broken => "broken",
            AssetStatus::Disposed => "disposed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown asset status '{s}'")))
    }

    /// Disposed assets never leave that state and never depreciate again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssetStatus::Disposed)
    }

    /// The full transition table.
    pub fn can_transition_to(self, to: AssetStatus) -> bool {
        use AssetStatus::*;
        match (self, to) {
            (Available, Assigned) | (Assigned, Available) => true,
            (Available, InRepair) | (InRepair, Available) => true,
            (Available, Lost) | (Available, Broken) => true,
            (Available | Assigned | InRepair | Lost | Broken, Disposed) => true,
            (Disposed, _) => false,
            (Available, Available)
            | (Assigned, Assigned | InRepair | Lost | Broken)
            | (InRepair, Assigned | InRepair | Lost | Broken)
            | (Lost, Available | Assigned | InRepair | Lost | Broken)
            | (Broken, Available | Assigned | InRepair | Lost | Broken) => false,
        }
    }

    pub fn transition(self, to: AssetStatus) -> Result<AssetStatus, TransitionError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(TransitionError::Invalid { from: self, to })
        }
    }
}

impl core::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEvent {
    pub id: EventId,
    pub tenant_id: TenantId,
    pub asset_id: AssetId,
    /// Stable event name, e.g. "asset.status.disposed".
    pub event_type: String,
    pub from_status: AssetStatus,
    pub to_status: AssetStatus,
    pub description: String,
    pub performed_by: UserId,
    pub performed_at: DateTime<Utc>,
}

impl AssetEvent {
    /// Validate `from -> to` and build the event describing it.
    pub fn status_changed(
        tenant_id: TenantId,
        asset_id: AssetId,
        from: AssetStatus,
        to: AssetStatus,
        note: Option<&str>,
        performed_by: UserId,
        performed_at: DateTime<Utc>,
    ) -> Result<Self, TransitionError> {
        from.transition(to)?;

        let description = match note.map(str::trim).filter(|n| !n.is_empty()) {
            Some(note) => format!("status changed from {from} to {to}: {note}"),
            None => format!("status changed from {from} to {to}"),
        };

        Ok(Self {
            id: EventId::new(),
            tenant_id,
            asset_id,
            event_type: format!("asset.status.{to}"),
            from_status: from,
            to_status: to,
            description,
            performed_by,
            performed_at,
        })
    }
}

impl Entity for AssetEvent {
    type Id = EventId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for AssetEvent {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AssetStatus::*;

    #[test]
    fn transition_table_matches_lifecycle() {
        let allowed = [
            (Available, Assigned),
            (Assigned, Available),
            (Available, InRepair),
            (InRepair, Available),
            (Available, Lost),
            (Available, Broken),
            (Available, Disposed),
            (Assigned, Disposed),
            (InRepair, Disposed),
            (Lost, Disposed),
            (Broken, Disposed),
        ];

        for from in AssetStatus::ALL {
            for to in AssetStatus::ALL {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} should be {}",
                    if expected { "allowed" } else { "rejected" }
                );
            }
        }
    }

    #[test]
    fn disposed_is_terminal() {
        assert!(Disposed.is_terminal());
        for to in AssetStatus::ALL {
            assert_eq!(
                Disposed.transition(to),
                Err(TransitionError::Invalid { from: Disposed, to })
            );
        }
    }

    #[test]
    fn event_carries_note_and_type() {
        let ev = AssetEvent::status_changed(
            TenantId::new(),
            AssetId::new(),
            Assigned,
            Disposed,
            Some("  sold at auction "),
            UserId::new(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(ev.event_type, "asset.status.disposed");
        assert_eq!(ev.description, "status changed from assigned to disposed: sold at auction");
    }

    #[test]
    fn invalid_transition_builds_no_event() {
        let res = AssetEvent::status_changed(
            TenantId::new(),
            AssetId::new(),
            Lost,
            Available,
            None,
            UserId::new(),
            Utc::now(),
        );
        assert!(res.is_err());
    }

    #[test]
    fn status_names_round_trip() {
        for st in AssetStatus::ALL {
            assert_eq!(AssetStatus::parse(st.as_str()).unwrap(), st);
        }
        assert!(AssetStatus::parse("stolen").is_err());
    }
}
