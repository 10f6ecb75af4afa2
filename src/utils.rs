use crate::{prelude::*, sv::commission::MICRO_USDC};

pub fn format_usdc(micro: i64) -> String {
  format!("{}.{:02}", micro / MICRO_USDC, (micro.abs() % MICRO_USDC) / 10_000)
}

#[allow(dead_code)]
pub fn format_date(date: DateTime) -> String {
  date.format("%d.%m.%Y %H:%M").to_string()
}
