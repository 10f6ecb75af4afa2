use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Db(#[from] sea_orm::DbErr),

  #[error("broker not found")]
  BrokerNotFound,

  #[error("referrer not found")]
  ReferrerNotFound,

  #[error("sale not found")]
  SaleNotFound,

  #[error("sale already confirmed")]
  SaleAlreadyConfirmed,

  #[error("sale is cancelled")]
  SaleCancelled,

  #[error("commission not found")]
  CommissionNotFound,

  #[error("broker level not found")]
  LevelNotFound,

  #[error("invalid arguments: {0}")]
  InvalidArgs(String),

  #[error("internal: {0}")]
  Internal(String),
}
