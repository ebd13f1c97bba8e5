//! HTTP surface: `GET /`, `GET /health` and `POST /predict`.

use crate::application::PredictionService;
use crate::domain::errors::{ErrorKind, PredictionError};
use crate::domain::market::symbol::DEFAULT_SYMBOL;
use crate::domain::ml::prediction::{Direction, PredictionResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::{self, Reply, Response};
use warp::{Filter, Rejection};

pub const DEFAULT_MINUTES: i64 = 120;
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Error kinds answered with something other than 500.
const STATUS_TABLE: &[(ErrorKind, StatusCode)] =
    &[(ErrorKind::UnsupportedHorizon, StatusCode::BAD_REQUEST)];

pub fn status_for(kind: ErrorKind) -> StatusCode {
    STATUS_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, status)| *status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[derive(Debug, Default, Deserialize)]
struct PredictRequest {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    minutes: Option<Value>,
}

/// Accepts an integer, a float (truncated) or a numeric string.
fn parse_minutes(raw: Option<Value>) -> Result<i64, PredictionError> {
    let invalid = |v: &Value| PredictionError::invalid_request(format!("invalid minutes: {}", v));
    match raw {
        None | Some(Value::Null) => Ok(DEFAULT_MINUTES),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or_else(|| invalid(&Value::Number(n.clone()))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(&Value::String(s.clone()))),
        Some(other) => Err(invalid(&other)),
    }
}

fn parse_predict_request(body: &[u8]) -> Result<(String, i64), PredictionError> {
    if body.len() > MAX_BODY_BYTES {
        return Err(PredictionError::invalid_request(format!(
            "body of {} bytes exceeds {} bytes",
            body.len(),
            MAX_BODY_BYTES
        )));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| PredictionError::invalid_request(format!("body is not valid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(PredictionError::invalid_request("body is not a JSON object"));
    }
    let request: PredictRequest = serde_json::from_value(value)
        .map_err(|e| PredictionError::invalid_request(e.to_string()))?;
    let symbol = request
        .symbol
        .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
    let minutes = parse_minutes(request.minutes)?;
    Ok((symbol, minutes))
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub symbol: String,
    pub prediction: Direction,
    pub confidence: f64,
    pub current_price: f64,
    pub status: &'static str,
    pub timeframe_minutes: i64,
    pub timeframe_hours: u32,
    pub model_used: String,
    pub probability_up: f64,
    pub probability_down: f64,
}

impl From<&PredictionResult> for PredictResponse {
    fn from(result: &PredictionResult) -> Self {
        Self {
            symbol: result.symbol.clone(),
            prediction: result.prediction.direction,
            confidence: round4(result.prediction.confidence),
            current_price: result.current_price,
            status: "success",
            timeframe_minutes: result.requested_minutes,
            timeframe_hours: result.horizon.hours(),
            model_used: result.model_used.clone(),
            probability_up: round4(result.prediction.probability_up),
            probability_down: round4(result.prediction.probability_down()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
}

pub fn error_response(err: &PredictionError) -> Response {
    let status = status_for(err.kind());
    let body = ErrorResponse {
        error: err.to_string(),
        status: status.is_server_error().then_some("failed"),
    };
    reply::with_status(reply::json(&body), status).into_response()
}

async fn handle_predict(
    body: Bytes,
    service: Arc<PredictionService>,
) -> Result<Response, Infallible> {
    let outcome = match parse_predict_request(&body) {
        Ok((symbol, minutes)) => service.predict(&symbol, minutes).await,
        Err(e) => Err(e),
    };

    Ok(match outcome {
        Ok(result) => reply::json(&PredictResponse::from(&result)).into_response(),
        Err(e) => {
            warn!("Prediction failed: {}", e);
            error_response(&e)
        }
    })
}

fn with_service(
    service: Arc<PredictionService>,
) -> impl Filter<Extract = (Arc<PredictionService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

pub fn routes(
    service: Arc<PredictionService>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let home = warp::path::end().and(warp::get()).map(|| {
        reply::json(&json!({
            "status": "running",
            "msg": "Crypto Prediction API"
        }))
        .into_response()
    });

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_service(service.clone()))
        .map(|service: Arc<PredictionService>| {
            reply::json(&json!({
                "status": "healthy",
                "models_loaded": service.registry().models_loaded()
            }))
            .into_response()
        });

    let predict = warp::path("predict")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_service(service))
        .and_then(handle_predict);

    home.or(health).unify().or(predict).unify()
}

/// Serves until `shutdown` resolves.
pub async fn serve(
    service: Arc<PredictionService>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let (bound, server) =
        warp::serve(routes(service)).try_bind_with_graceful_shutdown(addr, shutdown)?;
    info!("Listening on http://{}", bound);
    server.await;
    Ok(())
}
