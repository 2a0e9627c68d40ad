use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    ServiceRequests,
    Technicians,
    Reviews,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Row-level change notification. Carries only the row id; consumers fetch
/// the row they care about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub row_id: Uuid,
}

impl ChangeEvent {
    pub fn created(table: Table, row_id: Uuid) -> Self {
        Self {
            table,
            kind: ChangeKind::Created,
            row_id,
        }
    }

    pub fn updated(table: Table, row_id: Uuid) -> Self {
        Self {
            table,
            kind: ChangeKind::Updated,
            row_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: super::RequestStatus,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub total: usize,
    pub by_status: Vec<StatusCount>,
}
