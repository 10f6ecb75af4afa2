use sea_orm_migration::prelude::*;

use super::m20260805_000001_create_broker_levels::BrokerLevels;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Brokers::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Brokers::UserId)
              .big_integer()
              .not_null()
              .primary_key(),
          )
          .col(ColumnDef::new(Brokers::DisplayName).string().null())
          .col(
            ColumnDef::new(Brokers::Role).string().not_null().default("user"),
          )
          .col(
            ColumnDef::new(Brokers::LevelId).integer().not_null().default(1),
          )
          .col(
            ColumnDef::new(Brokers::TotalWeeksSold)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Brokers::TotalCommissionsMicro)
              .big_integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Brokers::BonusesClaimed)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Brokers::RegDate).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_brokers_level")
              .from(Brokers::Table, Brokers::LevelId)
              .to(BrokerLevels::Table, BrokerLevels::Id),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_brokers_level")
          .table(Brokers::Table)
          .col(Brokers::LevelId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Brokers::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Brokers {
  Table,
  UserId,
  DisplayName,
  Role,
  LevelId,
  TotalWeeksSold,
  TotalCommissionsMicro,
  BonusesClaimed,
  RegDate,
}
