use axum::extract::{Query, State};
use axum::Json;
use rollup_core::report::{AnalyticsReport, CheckInReport, IndicatorMetrics, ProductMetrics};
use rollup_core::FilterParams;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/analytics?output=&indicator=&workPackage=&productId=
pub async fn get_analytics(
    State(app): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<AnalyticsReport>, AppError> {
    Ok(Json(app.engine.analytics(params).await?))
}

/// GET /api/analytics/indicators: indicator rows plus adoption totals.
pub async fn get_indicator_metrics(
    State(app): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<IndicatorMetrics>, AppError> {
    Ok(Json(app.engine.indicator_metrics(params).await?))
}

/// GET /api/analytics/products: product rows plus delivery-status counts.
pub async fn get_product_metrics(
    State(app): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<ProductMetrics>, AppError> {
    Ok(Json(app.engine.product_metrics(params).await?))
}

/// GET /api/check-ins: check-in dates bucketed by urgency.
pub async fn get_check_ins(
    State(app): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<CheckInReport>, AppError> {
    Ok(Json(app.engine.check_ins(params).await?))
}
