pub use sea_orm_migration::prelude::*;

mod m20260805_000001_create_broker_levels;
mod m20260805_000002_create_brokers;
mod m20260805_000003_create_referrals;
mod m20260805_000004_create_sales;
mod m20260805_000005_create_commissions;
mod m20260805_000006_create_elite_benefits;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260805_000001_create_broker_levels::Migration),
      Box::new(m20260805_000002_create_brokers::Migration),
      Box::new(m20260805_000003_create_referrals::Migration),
      Box::new(m20260805_000004_create_sales::Migration),
      Box::new(m20260805_000005_create_commissions::Migration),
      Box::new(m20260805_000006_create_elite_benefits::Migration),
    ]
  }
}
