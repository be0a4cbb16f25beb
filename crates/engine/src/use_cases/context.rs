//! Sequence details: the current sequence with who is in it and how they relate.

use std::collections::HashSet;
use std::sync::Arc;

use statedb_domain::{SequenceDetails, SessionId};

use crate::infrastructure::ports::{EntityRepo, PlayerRepo, ProgressRepo, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

pub struct ContextUseCases {
    progress: Arc<dyn ProgressRepo>,
    entity: Arc<dyn EntityRepo>,
    player: Arc<dyn PlayerRepo>,
}

impl ContextUseCases {
    pub fn new(
        progress: Arc<dyn ProgressRepo>,
        entity: Arc<dyn EntityRepo>,
        player: Arc<dyn PlayerRepo>,
    ) -> Self {
        Self {
            progress,
            entity,
            player,
        }
    }

    /// Edges are kept only when both endpoints are placed in the sequence.
    pub async fn sequence_details(
        &self,
        session_id: SessionId,
    ) -> Result<SequenceDetails, ContextError> {
        let sequence = self
            .progress
            .current_sequence(session_id)
            .await?
            .ok_or(ContextError::SessionNotFound(session_id))?;

        let roster = self
            .entity
            .sequence_roster(session_id, &sequence.sequence_id)
            .await?;

        let keys: HashSet<&str> = roster
            .npcs
            .iter()
            .chain(roster.enemies.iter())
            .map(|e| e.scenario_entity_id.as_str())
            .collect();
        let entity_relations = self
            .entity
            .session_relations(session_id)
            .await?
            .into_iter()
            .filter(|r| keys.contains(r.from_id.as_str()) && keys.contains(r.to_id.as_str()))
            .collect();

        let npc_ids: HashSet<_> = roster.npcs.iter().map(|n| n.id).collect();
        let player_npc_relations = self
            .player
            .session_npc_relations(session_id)
            .await?
            .into_iter()
            .filter(|r| npc_ids.contains(r.npc_id.as_uuid()))
            .collect();

        Ok(SequenceDetails {
            session_id,
            sequence,
            npcs: roster.npcs,
            enemies: roster.enemies,
            entity_relations,
            player_npc_relations,
        })
    }
}
