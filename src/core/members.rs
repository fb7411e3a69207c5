//! Member mutations.

use super::{
    model::{Member, MemberPatch, require_text},
    pending::RemoteWrite,
    state::{TripState, log_rejection},
};
use crate::errors::{Error, Result};
use tracing::info;
use uuid::Uuid;

impl TripState {
    /// Adds a member with the configured planned contribution and nothing given yet.
    pub fn add_member(&mut self, name: &str) -> Result<Uuid> {
        require_text("member name", name).inspect_err(log_rejection("add_member"))?;

        let member = Member {
            id: Uuid::new_v4(),
            trip_id: self.trip_id,
            name: name.trim().to_string(),
            planned: self.config.trip.new_member_planned,
            given: 0.0,
        };
        let id = member.id;
        info!(member = %member.name, "Adding member");

        self.queue(RemoteWrite::InsertMember(member.to_active_model()));
        self.members.push(member);
        self.issue_pending();
        Ok(id)
    }

    /// Applies a partial update to a member.
    pub fn update_member(&mut self, id: Uuid, patch: &MemberPatch) -> Result<()> {
        patch
            .validate()
            .inspect_err(log_rejection("update_member"))?;
        let member = self
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(Error::MemberNotFound { id })
            .inspect_err(log_rejection("update_member"))?;

        member.apply(patch);
        self.queue(RemoteWrite::UpdateMember(patch.to_active_model(id)));
        self.issue_pending();
        Ok(())
    }

    /// Removes a member. Expenses they paid keep their `paid_by` text.
    pub fn delete_member(&mut self, id: Uuid) -> Result<()> {
        let index = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or(Error::MemberNotFound { id })
            .inspect_err(log_rejection("delete_member"))?;

        let removed = self.members.remove(index);
        info!(member = %removed.name, "Removed member");
        self.queue(RemoteWrite::DeleteMember(id));
        self.issue_pending();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::pending::EntityRef, test_utils::*};

    #[tokio::test]
    async fn test_add_member_uses_configured_defaults() -> Result<()> {
        let mut state = synced_state().await?;
        let before = state.members().len();

        let id = state.add_member("Ravi")?;
        let member = state.member(id).unwrap();
        assert_eq!(member.planned, 3000.0);
        assert_eq!(member.given, 0.0);
        assert_eq!(member.trip_id, state.trip_id());
        assert_eq!(state.members().len(), before + 1);
        assert_eq!(state.pending().for_entity(EntityRef::Member(id)).count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_member_rejects_blank_name() -> Result<()> {
        let mut state = synced_state().await?;
        let before = state.members().len();

        let result = state.add_member("   ");
        assert!(matches!(result, Err(Error::EmptyField { .. })));
        assert_eq!(state.members().len(), before);
        assert!(state.pending().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_member_given_moves_cash_balance() -> Result<()> {
        let mut state = synced_state().await?;
        let id = state.add_member("Ravi")?;
        let cash_before = state.totals().cash_balance;

        state.update_member(
            id,
            &MemberPatch {
                given: Some(1500.0),
                ..Default::default()
            },
        )?;
        assert_eq!(state.totals().cash_balance, cash_before + 1500.0);

        let report = state.flush_pending().await;
        assert!(report.is_clean());
        let stored = state.remote.members_for_trip(state.trip_id().unwrap()).await?;
        let row = stored.iter().find(|m| m.id == id).unwrap();
        assert_eq!(row.given_amount, Some(1500.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_member_rejects_negative_amount() -> Result<()> {
        let mut state = synced_state().await?;
        let id = state.members()[0].id;

        let result = state.update_member(
            id,
            &MemberPatch {
                planned: Some(-1.0),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        assert_eq!(state.members()[0].planned, 3000.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_member_is_rejected() -> Result<()> {
        let mut state = synced_state().await?;
        let missing = Uuid::new_v4();

        assert!(matches!(
            state.delete_member(missing),
            Err(Error::MemberNotFound { .. })
        ));
        assert!(matches!(
            state.update_member(missing, &MemberPatch::default()),
            Err(Error::MemberNotFound { .. })
        ));
        assert!(state.pending().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_member() -> Result<()> {
        let mut state = synced_state().await?;
        let id = state.members()[0].id;
        let count = state.members().len();

        state.delete_member(id)?;
        assert_eq!(state.members().len(), count - 1);
        assert!(state.member(id).is_none());

        state.flush_pending().await;
        let stored = state.remote.members_for_trip(state.trip_id().unwrap()).await?;
        assert_eq!(stored.len(), count - 1);
        Ok(())
    }
}
