use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::config::RatingsConfig;
use crate::error::SitlyError;
use crate::ratings::{PageRequest, Rating, RatingCriteria, Ratings, Role};

/// Query parameters for the ratings feed
#[derive(Debug, Default, Deserialize)]
pub struct RatingsParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<String>,
    pub has_references: Option<bool>,
    pub has_first_aid: Option<bool>,
    pub place: Option<String>,
    /// Comma separated ids of the ratings the client was shown on page 1
    pub seen: Option<String>,
}

/// Response structure for the ratings feed
#[derive(Debug, Serialize)]
pub struct RatingsResponse {
    pub rows: Vec<Rating>,
    pub count: i64,
    pub page: u32,
    pub limit: u32,
}

impl RatingsParams {
    fn page_request(&self, config: &RatingsConfig) -> Result<PageRequest, SitlyError> {
        PageRequest::checked(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(config.default_page_size),
            config.max_page_size,
        )
    }

    fn criteria(&self) -> Result<RatingCriteria, SitlyError> {
        let role = match &self.role {
            Some(role) => Some(role.parse::<Role>().map_err(|_| {
                SitlyError::InvalidInput(format!("unknown role '{role}'"))
            })?),
            None => None,
        };

        Ok(RatingCriteria {
            role,
            has_references: self.has_references,
            has_first_aid: self.has_first_aid,
            place: self.place.clone(),
        })
    }

    fn seen_ids(&self) -> Result<Option<Vec<i64>>, SitlyError> {
        let Some(seen) = &self.seen else {
            return Ok(None);
        };

        seen.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                id.parse::<i64>()
                    .map_err(|_| SitlyError::InvalidInput(format!("invalid rating id '{id}'")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

fn bad_request(e: SitlyError) -> (StatusCode, String) {
    debug!("Rejected ratings request: {}", e);
    (StatusCode::BAD_REQUEST, e.to_string())
}

/// GET /api/ratings?page=&limit=&role=&has_references=&has_first_aid=&place=&seen=
/// Returns one page of the ratings feed. Pages after the first keep the ratings shown on
/// page 1 ahead of everything else; pass `seen` to anchor to exactly what the client saw.
pub async fn get_ratings(
    State(state): State<AppState>,
    Query(params): Query<RatingsParams>,
) -> Result<Json<RatingsResponse>, (StatusCode, String)> {
    let page = params.page_request(&state.ratings).map_err(bad_request)?;
    let criteria = params.criteria().map_err(bad_request)?;
    let seen = params.seen_ids().map_err(bad_request)?;

    let db = state.db.clone();
    let result = tokio::task::spawn_blocking(move || {
        let conn = db.conn()?;
        match seen {
            Some(seen) => Ratings::find_page_after(&conn, &criteria, page, &seen),
            None => Ratings::find_page(&conn, &criteria, page),
        }
    })
    .await
    .map_err(|e| {
        error!("Ratings query task failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Ratings query task failed: {}", e),
        )
    })?;

    match result {
        Ok(rating_page) => {
            debug!(
                "Ratings page {} fetched: {} rows of {} (limit={}, seen={})",
                page.number,
                rating_page.rows.len(),
                rating_page.count,
                page.limit,
                params.seen.is_some()
            );
            Ok(Json(RatingsResponse {
                rows: rating_page.rows,
                count: rating_page.count,
                page: page.number,
                limit: page.limit,
            }))
        }
        Err(e) => {
            error!("Failed to fetch ratings page {}: {}", page.number, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch ratings: {}", e),
            ))
        }
    }
}
