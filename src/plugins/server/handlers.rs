use std::sync::Arc;

use axum::{
  Json,
  body::Bytes,
  extract::{Query, State},
  http::{HeaderMap, StatusCode},
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{
  entity::{commission, referral, sale},
  prelude::*,
  state::AppState,
  sv,
  sv::commission::LevelOutcome,
};

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize)]
pub struct ApiStatus {
  success: bool,
  msg: Option<String>,
}

impl ApiStatus {
  fn ok() -> Json<ApiStatus> {
    Json(ApiStatus { success: true, msg: None })
  }

  fn err(msg: impl Into<String>) -> Json<ApiStatus> {
    Json(ApiStatus { success: false, msg: Some(msg.into()) })
  }
}

type Rejection = (StatusCode, Json<ApiStatus>);

fn reject(err: Error) -> Rejection {
  let code = match &err {
    Error::BrokerNotFound
    | Error::ReferrerNotFound
    | Error::SaleNotFound
    | Error::CommissionNotFound
    | Error::LevelNotFound => StatusCode::NOT_FOUND,
    Error::SaleAlreadyConfirmed | Error::SaleCancelled => StatusCode::CONFLICT,
    Error::InvalidArgs(_) => StatusCode::BAD_REQUEST,
    Error::Db(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
  };

  if code == StatusCode::INTERNAL_SERVER_ERROR {
    error!("request failed: {err}");
  }

  (code, ApiStatus::err(err.to_string()))
}

fn authorized(app: &AppState, headers: &HeaderMap) -> Result<(), Rejection> {
  let key = headers.get("x-api-key").and_then(|v| v.to_str().ok());

  if key == Some(app.config.api_secret.as_str()) {
    Ok(())
  } else {
    Err((StatusCode::UNAUTHORIZED, ApiStatus::err("Invalid API key")))
  }
}

/// Verify a hex HMAC-SHA256 of the raw webhook body.
pub fn verify_signature(
  secret: &str,
  body: &[u8],
  signature_hex: &str,
) -> bool {
  let Ok(signature) = hex::decode(signature_hex) else {
    return false;
  };

  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .expect("HMAC accepts any key length");
  mac.update(body);
  mac.verify_slice(&signature).is_ok()
}

pub async fn health() -> &'static str {
  "ok"
}

#[derive(Deserialize)]
pub struct BrokerQuery {
  pub broker_id: i64,
}

pub async fn broker_level(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(query): Query<BrokerQuery>,
) -> Result<Json<sv::level::LevelInfo>, Rejection> {
  authorized(&app, &headers)?;

  let info = sv::Level::new(&app.db)
    .level_info(query.broker_id)
    .await
    .map_err(reject)?;

  Ok(Json(info))
}

#[derive(Deserialize)]
pub struct RecomputeReq {
  pub broker_id: i64,
}

pub async fn recompute_level(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(req): Json<RecomputeReq>,
) -> Result<Json<sv::level::LevelUpdate>, Rejection> {
  authorized(&app, &headers)?;

  let update = sv::Level::new(&app.db)
    .update_level(req.broker_id)
    .await
    .map_err(reject)?;

  Ok(Json(update))
}

pub async fn broker_commissions(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(query): Query<BrokerQuery>,
) -> Result<Json<Vec<commission::Model>>, Rejection> {
  authorized(&app, &headers)?;

  let rows = sv::Commission::new(&app.db)
    .by_broker(query.broker_id)
    .await
    .map_err(reject)?;

  Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct AttachReferralReq {
  pub referred_user_id: i64,
  pub broker_id: i64,
}

pub async fn attach_referral(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(req): Json<AttachReferralReq>,
) -> Result<(StatusCode, Json<referral::Model>), Rejection> {
  authorized(&app, &headers)?;

  let edge = sv::Referral::new(&app.db)
    .attach(req.referred_user_id, req.broker_id)
    .await
    .map_err(reject)?;

  Ok((StatusCode::CREATED, Json(edge)))
}

#[derive(Deserialize)]
pub struct CreateSaleReq {
  pub buyer_user_id: i64,
  pub amount_micro: i64,
  pub weeks: i32,
}

pub async fn create_sale(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(req): Json<CreateSaleReq>,
) -> Result<(StatusCode, Json<sale::Model>), Rejection> {
  authorized(&app, &headers)?;

  let sale = sv::Sale::new(&app.db)
    .create(req.buyer_user_id, req.amount_micro, req.weeks)
    .await
    .map_err(reject)?;

  Ok((StatusCode::CREATED, Json(sale)))
}

#[derive(Deserialize)]
pub struct ConfirmSaleReq {
  pub event_id: String,
  pub sale_id: String,
}

/// Payment-gateway callback. The raw body is HMAC-signed; redelivered
/// events and re-confirmed sales both collapse into a 200 so the
/// gateway stops retrying.
pub async fn confirm_sale(
  State(app): State<Arc<AppState>>,
  headers: HeaderMap,
  body: Bytes,
) -> (StatusCode, Json<ApiStatus>) {
  let Some(signature) =
    headers.get("x-signature").and_then(|v| v.to_str().ok())
  else {
    return (StatusCode::UNAUTHORIZED, ApiStatus::err("Missing signature"));
  };

  if !verify_signature(&app.config.api_secret, &body, signature) {
    return (StatusCode::UNAUTHORIZED, ApiStatus::err("Invalid signature"));
  }

  let req: ConfirmSaleReq = match json::from_slice(&body) {
    Ok(req) => req,
    Err(err) => {
      return (
        StatusCode::BAD_REQUEST,
        ApiStatus::err(format!("Bad payload: {err}")),
      );
    }
  };

  if !app.mark_webhook_event(&req.event_id) {
    debug!("webhook replay ignored: {}", req.event_id);
    return (StatusCode::OK, ApiStatus::ok());
  }

  let result = sv::Sale::with_hold_days(&app.db, app.config.hold_days)
    .confirm(&req.sale_id)
    .await;

  match result {
    Ok((sale, outcome)) => {
      if let LevelOutcome::Failed(reason) = &outcome.level {
        warn!("sale {} confirmed but level update failed: {reason}", sale.id);
      }
      (StatusCode::OK, ApiStatus::ok())
    }
    Err(Error::SaleAlreadyConfirmed) => (StatusCode::OK, ApiStatus::ok()),
    Err(err) => {
      // Let the gateway retry this delivery
      app.forget_webhook_event(&req.event_id);
      let (code, status) = reject(err);
      (code, status)
    }
  }
}
