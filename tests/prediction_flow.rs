mod common;

use common::{BrokenClassifier, EXTRA_CANDLES, FixedClassifier, WINDOW, pair, service};
use signalcast::application::ml::xgboost::XgbClassifier;
use signalcast::domain::errors::{ErrorKind, PredictionError};
use signalcast::domain::ml::prediction::Direction;
use signalcast::infrastructure::MockCandleSource;
use signalcast::infrastructure::mock::{constant_candles, synthetic_candles};
use std::sync::Arc;

#[tokio::test]
async fn test_prediction_above_threshold_is_up() {
    let candles = synthetic_candles(200, 100.0);
    let last_close = candles.last().unwrap().close;
    let source = Arc::new(MockCandleSource::new(candles));
    let service = service(vec![pair(2, Box::new(FixedClassifier(0.73)))], source.clone());

    let result = service.predict("BTC/USDT", 120).await.unwrap();

    assert_eq!(result.prediction.direction, Direction::Up);
    assert!((result.prediction.confidence - 0.73).abs() < 1e-12);
    assert_eq!(result.horizon.hours(), 2);
    assert_eq!(result.requested_minutes, 120);
    assert_eq!(result.model_used, "LSTM+XGBoost 2h");
    assert_eq!(result.current_price, last_close);

    // Window plus indicator warm-up
    assert_eq!(
        source.requests().await,
        vec![("BTC/USDT".to_string(), WINDOW + EXTRA_CANDLES)]
    );
}

#[tokio::test]
async fn test_prediction_below_threshold_is_down() {
    let source = Arc::new(MockCandleSource::new(synthetic_candles(200, 50_000.0)));
    let service = service(vec![pair(2, Box::new(FixedClassifier(0.2)))], source);

    let result = service.predict("BTC/USDT", 120).await.unwrap();

    assert_eq!(result.prediction.direction, Direction::Down);
    assert!((result.prediction.confidence - 0.8).abs() < 1e-12);
}

#[tokio::test]
async fn test_exact_threshold_is_down() {
    let source = Arc::new(MockCandleSource::new(synthetic_candles(200, 100.0)));
    let service = service(vec![pair(2, Box::new(FixedClassifier(0.5)))], source);

    let result = service.predict("BTC/USDT", 120).await.unwrap();

    assert_eq!(result.prediction.direction, Direction::Down);
    assert_eq!(result.prediction.confidence, 0.5);
}

#[tokio::test]
async fn test_minutes_resolve_to_nearest_loaded_horizon() {
    let source = Arc::new(MockCandleSource::new(synthetic_candles(200, 100.0)));
    let service = service(
        vec![
            pair(3, Box::new(FixedClassifier(0.9))),
            pair(6, Box::new(FixedClassifier(0.1))),
        ],
        source,
    );

    // 150 minutes rounds to 3h
    let result = service.predict("BTC/USDT", 150).await.unwrap();
    assert_eq!(result.horizon.hours(), 3);
    assert_eq!(result.prediction.direction, Direction::Up);

    // 5h sits between 4h and 6h; 4h is declared first and is not loaded
    let err = service.predict("BTC/USDT", 300).await.unwrap_err();
    assert!(matches!(err, PredictionError::UnsupportedHorizon { hours: 4 }));
}

#[tokio::test]
async fn test_unsupported_horizon_skips_fetch() {
    let source = Arc::new(MockCandleSource::new(synthetic_candles(200, 100.0)));
    let service = service(vec![], source.clone());

    let err = service.predict("BTC/USDT", 120).await.unwrap_err();

    assert_eq!(err.to_string(), "Model for 2h not found");
    assert!(source.requests().await.is_empty());
}

#[tokio::test]
async fn test_flat_market_has_insufficient_data() {
    // Zero bandwidth leaves the band position undefined on every row
    let source = Arc::new(MockCandleSource::new(constant_candles(60, 100.0)));
    let service = service(vec![pair(2, Box::new(FixedClassifier(0.9)))], source);

    let err = service.predict("BTC/USDT", 120).await.unwrap_err();

    assert!(matches!(
        err,
        PredictionError::InsufficientData {
            required: WINDOW,
            available: 0
        }
    ));
}

#[tokio::test]
async fn test_short_history_has_insufficient_data() {
    // Volatility warm-up purges the first 20 rows, leaving 9
    let source = Arc::new(MockCandleSource::new(synthetic_candles(29, 100.0)));
    let service = service(vec![pair(2, Box::new(FixedClassifier(0.9)))], source);

    let err = service.predict("BTC/USDT", 120).await.unwrap_err();

    assert!(matches!(
        err,
        PredictionError::InsufficientData {
            required: WINDOW,
            available: 9
        }
    ));
}

#[tokio::test]
async fn test_exactly_one_window_of_complete_rows_is_enough() {
    let source = Arc::new(MockCandleSource::new(synthetic_candles(30, 100.0)));
    let service = service(vec![pair(2, Box::new(FixedClassifier(0.9)))], source);

    let result = service.predict("BTC/USDT", 120).await.unwrap();

    assert_eq!(result.prediction.direction, Direction::Up);
}

#[tokio::test]
async fn test_empty_candle_response_has_insufficient_data() {
    let source = Arc::new(MockCandleSource::new(Vec::new()));
    let service = service(vec![pair(2, Box::new(FixedClassifier(0.9)))], source);

    let err = service.predict("BTC/USDT", 120).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InsufficientData);
}

#[tokio::test]
async fn test_upstream_failure_propagates() {
    let source = Arc::new(MockCandleSource::failing("CoinDCX API Error: 503"));
    let service = service(vec![pair(2, Box::new(FixedClassifier(0.9)))], source);

    let err = service.predict("BTC/USDT", 120).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamFetch);
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_classifier_failure_is_inference_error() {
    let source = Arc::new(MockCandleSource::new(synthetic_candles(200, 100.0)));
    let service = service(vec![pair(2, Box::new(BrokenClassifier))], source);

    let err = service.predict("BTC/USDT", 120).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Inference);
}

#[tokio::test]
async fn test_out_of_range_probability_is_inference_error() {
    let source = Arc::new(MockCandleSource::new(synthetic_candles(200, 100.0)));
    let service = service(vec![pair(2, Box::new(FixedClassifier(1.5)))], source);

    let err = service.predict("BTC/USDT", 120).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Inference);
}

#[tokio::test]
async fn test_xgboost_stump_on_encoder_output() {
    // One stump: any realistic encoding goes left to +2.0
    let model = XgbClassifier::from_json_str(
        r#"{
          "learner": {
            "gradient_booster": {
              "name": "gbtree",
              "model": {
                "trees": [{
                  "left_children": [1, -1, -1],
                  "right_children": [2, -1, -1],
                  "split_indices": [0, 0, 0],
                  "split_conditions": [1e9, 2.0, -2.0],
                  "default_left": [0, 0, 0]
                }]
              }
            },
            "learner_model_param": {"base_score": "0.5", "num_class": "0"},
            "objective": {"name": "binary:logistic"}
          }
        }"#,
    )
    .unwrap();

    let source = Arc::new(MockCandleSource::new(synthetic_candles(200, 100.0)));
    let service = service(vec![pair(2, Box::new(model))], source);

    let result = service.predict("BTC/USDT", 120).await.unwrap();

    let expected = 1.0 / (1.0 + (-2.0f64).exp());
    assert_eq!(result.prediction.direction, Direction::Up);
    assert!((result.prediction.probability_up - expected).abs() < 1e-6);
}
