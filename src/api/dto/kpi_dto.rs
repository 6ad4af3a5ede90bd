use serde::Deserialize;
use validator::Validate;

use crate::domain::metric::kpi_series::{Aggregation, KpiQuery, DEFAULT_BUCKET_MINUTES};

/// Query string of `GET /kpi`, e.g. `?field=speedDl&test=cloud-download&agg=max`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct KpiQueryDto {
    #[validate(length(min = 1, max = 128))]
    pub field: String,
    pub test: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub bucket_minutes: Option<u32>,
    pub agg: Option<Aggregation>,
}

impl From<KpiQueryDto> for KpiQuery {
    fn from(dto: KpiQueryDto) -> Self {
        KpiQuery {
            field: dto.field,
            program: dto.test.filter(|t| !t.trim().is_empty()),
            bucket_minutes: dto.bucket_minutes.unwrap_or(DEFAULT_BUCKET_MINUTES),
            aggregation: dto.agg.unwrap_or_default(),
        }
    }
}
