use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use super::DutyService;
use crate::error::AppError;
use crate::tariff::{Breakdown, CalculationInput, RuleTableSummary};

/// Router exposing the calculation entry point and rule-table maintenance.
pub fn duty_router(service: Arc<DutyService>) -> Router {
    Router::new()
        .route("/api/v1/duty/calculate", post(calculate_handler))
        .route("/api/v1/duty/rules", get(rules_handler))
        .route("/api/v1/duty/rules/reload", post(reload_handler))
        .with_state(service)
}

pub(crate) async fn calculate_handler(
    State(service): State<Arc<DutyService>>,
    Json(input): Json<CalculationInput>,
) -> Result<Json<Breakdown>, AppError> {
    let breakdown = service.calculate(&input)?;
    Ok(Json(breakdown))
}

pub(crate) async fn rules_handler(
    State(service): State<Arc<DutyService>>,
) -> Json<RuleTableSummary> {
    Json(service.rules_summary())
}

pub(crate) async fn reload_handler(
    State(service): State<Arc<DutyService>>,
) -> Result<Json<RuleTableSummary>, AppError> {
    let summary = service.reload_rules()?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::{DutyCalculator, RuleRepository, TariffSchedule};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router() -> Router {
        let calculator = DutyCalculator::new(
            Arc::new(RuleRepository::built_in()),
            Arc::new(TariffSchedule::default()),
        );
        duty_router(Arc::new(DutyService::new(calculator)))
    }

    fn payload(engine_cc: u32) -> Value {
        json!({
            "importer": "individual",
            "usage": "personal",
            "fuel": "Бензин",
            "engine_cc": engine_cc,
            "production_year": 2023,
            "declaration_date": "2025-03-01",
            "customs_value": "10000",
            "currency": "EUR",
            "fx": { "local_currency": "RUB", "rates": { "EUR": "100" } }
        })
    }

    async fn post_json(router: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let value = serde_json::from_slice(&bytes).expect("json body");
        (status, value)
    }

    #[tokio::test]
    async fn calculate_route_returns_a_breakdown() {
        let (status, body) = post_json(router(), "/api/v1/duty/calculate", &payload(2300)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["regime"], "personal");
        assert_eq!(body["age_bucket"], "≤3");
        let duty: Decimal =
            serde_json::from_value(body["duty_local"].clone()).expect("decimal duty");
        assert_eq!(duty, dec!(1426000));
    }

    #[tokio::test]
    async fn invalid_input_is_a_bad_request() {
        let (status, body) = post_json(router(), "/api/v1/duty/calculate", &payload(0)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .expect("error message")
            .contains("engine displacement"));
    }

    #[tokio::test]
    async fn unmatched_vehicles_are_unprocessable() {
        let mut request = payload(2300);
        request["fuel"] = json!("diesel");
        let (status, body) = post_json(router(), "/api/v1/duty/calculate", &request).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["miss"]["fuel"], "Дизель");
    }

    #[tokio::test]
    async fn rules_route_summarises_the_table() {
        let response = router()
            .oneshot(
                Request::get("/api/v1/duty/rules")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["built_in"], true);
        assert_eq!(body["rows"], 20);
        assert_eq!(body["source"]["kind"], "built_in");
    }
}
