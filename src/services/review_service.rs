use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::Backend;
use crate::error::{AppError, AppResult};
use crate::models::{
    ChangeEvent, NewReview, RequestStatus, Review, SatisfactionLevel, SubmitReviewRequest, Table,
};
use crate::services::events::EventBus;
use crate::utils::validators::non_blank;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Whole star count in range, given as a JSON number or numeric text.
fn parse_rating(value: Option<&Value>) -> Option<i32> {
    let stars = match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    i32::try_from(stars)
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
}

pub struct ReviewService {
    backend: Arc<dyn Backend>,
    events: EventBus,
}

impl ReviewService {
    pub fn new(backend: Arc<dyn Backend>, events: EventBus) -> Self {
        Self { backend, events }
    }

    /// Records a customer rating for a completed request. Nothing is written
    /// unless every check passes.
    pub async fn submit(&self, request_id: Uuid, payload: SubmitReviewRequest) -> AppResult<Review> {
        let request = self
            .backend
            .get_service_request(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".to_string()))?;

        if request.status != RequestStatus::Completed {
            return Err(AppError::BadRequest(
                "Only completed requests can be rated".to_string(),
            ));
        }

        let rating = parse_rating(payload.rating.as_ref()).ok_or(AppError::MissingRating)?;
        let satisfaction_level = payload
            .satisfaction
            .as_deref()
            .and_then(|s| s.parse::<SatisfactionLevel>().ok())
            .ok_or(AppError::MissingSatisfaction)?;

        let technician_id = request.assigned_technician.ok_or_else(|| {
            AppError::BadRequest("Request has no assigned technician".to_string())
        })?;

        let review = self
            .backend
            .insert_review(&NewReview {
                request_id,
                technician_id,
                rating,
                satisfaction_level,
                comment: non_blank(payload.comment.as_deref()),
            })
            .await?;

        self.events
            .publish(ChangeEvent::created(Table::Reviews, review.id));
        tracing::info!("Request {} rated {}/5", request_id, rating);
        Ok(review)
    }

    pub async fn list(&self, request_id: Uuid) -> AppResult<Vec<Review>> {
        Ok(self.backend.list_reviews(request_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ratings_are_whole_stars_in_range() {
        assert_eq!(parse_rating(Some(&json!(5))), Some(5));
        assert_eq!(parse_rating(Some(&json!(3.0))), Some(3));
        assert_eq!(parse_rating(Some(&json!(" 4 "))), Some(4));

        for bad in [json!(4.5), json!(0), json!(6), json!("five"), json!(null), json!([5])] {
            assert_eq!(parse_rating(Some(&bad)), None, "{} accepted", bad);
        }
        assert_eq!(parse_rating(None), None);
    }
}
