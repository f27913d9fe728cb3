use actix_web::{HttpResponse, Result, web};
use availability_engine::AvailabilityEngine;
use validator::Validate;

use crate::availability_types::*;

/// Aggregates availability for one campground and returns the full result
pub async fn get_availability(
    engine: web::Data<AvailabilityEngine>,
    path: web::Path<String>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, AvailabilityError> {
    let campground = CampgroundPath::new(&path.into_inner());
    campground
        .validate()
        .map_err(|e| AvailabilityError::Validation(format!("Validation error: {}", e)))?;

    let query = query.into_inner();
    query
        .validate()
        .map_err(|e| AvailabilityError::Validation(format!("Validation error: {}", e)))?;

    let run = query.into_run_config(&campground.campground_id);
    let result = engine.aggregate_availability(&run).await.map_err(|e| {
        log::error!("Availability run failed: {}", e);
        e
    })?;

    log::info!(
        "Campground {}: {} rows, {} ({} calls failed)",
        run.campground_id,
        result.rows.len(),
        result.summary.compact,
        result.report.calls_failed
    );

    Ok(HttpResponse::Ok().json(result))
}

/// Liveness probe
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}
