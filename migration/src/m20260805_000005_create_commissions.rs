use sea_orm_migration::prelude::*;

use super::{
  m20260805_000002_create_brokers::Brokers,
  m20260805_000004_create_sales::Sales,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Commissions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Commissions::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Commissions::BrokerId).big_integer().not_null())
          .col(ColumnDef::new(Commissions::SaleId).string().not_null())
          .col(
            ColumnDef::new(Commissions::SaleAmountMicro)
              .big_integer()
              .not_null(),
          )
          .col(ColumnDef::new(Commissions::RateBps).integer().not_null())
          .col(
            ColumnDef::new(Commissions::AmountMicro).big_integer().not_null(),
          )
          .col(
            ColumnDef::new(Commissions::ReferralLevel)
              .integer()
              .not_null()
              .default(1),
          )
          .col(ColumnDef::new(Commissions::LevelTag).string().null())
          .col(
            ColumnDef::new(Commissions::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(Commissions::HoldUntil).date_time().not_null())
          .col(ColumnDef::new(Commissions::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_commissions_broker")
              .from(Commissions::Table, Commissions::BrokerId)
              .to(Brokers::Table, Brokers::UserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_commissions_sale")
              .from(Commissions::Table, Commissions::SaleId)
              .to(Sales::Table, Sales::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_commissions_broker")
          .table(Commissions::Table)
          .col(Commissions::BrokerId)
          .to_owned(),
      )
      .await?;

    // A sale pays each referral level at most once
    manager
      .create_index(
        Index::create()
          .name("idx_commissions_sale_level")
          .table(Commissions::Table)
          .col(Commissions::SaleId)
          .col(Commissions::ReferralLevel)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Commissions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum Commissions {
  Table,
  Id,
  BrokerId,
  SaleId,
  SaleAmountMicro,
  RateBps,
  AmountMicro,
  ReferralLevel,
  LevelTag,
  Status,
  HoldUntil,
  CreatedAt,
}
