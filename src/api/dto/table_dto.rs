use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::dto::paginated_response::PaginatedResponse;
use crate::domain::fetch::paged_fetcher::StopReason;
use crate::domain::normalize::normalized_table::NormalizedRecord;

pub const DEFAULT_TABLE_LIMIT: usize = 100;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TableQuery {
    #[validate(range(min = 1, max = 10000))]
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Only records resolved to this program.
    pub program: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TableView {
    pub invocation_id: Uuid,
    pub fetched_at: DateTime<Utc>,
    pub stop: StopReason,
    pub programs: Vec<String>,
    pub columns: Vec<String>,
    pub probe_column: Option<&'static str>,
    pub time_column: Option<&'static str>,
    pub isp_column: Option<&'static str>,
    pub page: PaginatedResponse<NormalizedRecord>,
}
