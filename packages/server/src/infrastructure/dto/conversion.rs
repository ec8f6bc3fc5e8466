//! Conversion logic between DTOs and domain entities.

use crate::domain::RegistrySnapshot;
use crate::infrastructure::dto::http as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<RegistrySnapshot> for dto::ClientsDto {
    fn from(snapshot: RegistrySnapshot) -> Self {
        Self {
            connected: snapshot.connected.iter().map(|id| id.value()).collect(),
            queued: snapshot
                .queued
                .into_iter()
                .map(|(id, count)| (id.value(), count))
                .collect(),
        }
    }
}
