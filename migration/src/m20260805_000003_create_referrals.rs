use sea_orm_migration::prelude::*;

use super::m20260805_000002_create_brokers::Brokers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Referrals::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Referrals::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(Referrals::ReferredUserId).big_integer().not_null(),
          )
          .col(ColumnDef::new(Referrals::BrokerId).big_integer().not_null())
          .col(
            ColumnDef::new(Referrals::Level).integer().not_null().default(1),
          )
          .col(ColumnDef::new(Referrals::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_referrals_broker")
              .from(Referrals::Table, Referrals::BrokerId)
              .to(Brokers::Table, Brokers::UserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    // One referrer per user per referral level
    manager
      .create_index(
        Index::create()
          .name("idx_referrals_user_level")
          .table(Referrals::Table)
          .col(Referrals::ReferredUserId)
          .col(Referrals::Level)
          .unique()
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_referrals_broker")
          .table(Referrals::Table)
          .col(Referrals::BrokerId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Referrals::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Referrals {
  Table,
  Id,
  ReferredUserId,
  BrokerId,
  Level,
  CreatedAt,
}
