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
          .table(EliteBenefits::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(EliteBenefits::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(EliteBenefits::BrokerId).big_integer().not_null(),
          )
          .col(ColumnDef::new(EliteBenefits::PropertyId).string().not_null())
          .col(ColumnDef::new(EliteBenefits::BenefitType).string().not_null())
          .col(ColumnDef::new(EliteBenefits::OwnershipBps).integer().null())
          .col(ColumnDef::new(EliteBenefits::WeeksBonus).integer().null())
          .col(ColumnDef::new(EliteBenefits::AmountMicro).big_integer().null())
          .col(
            ColumnDef::new(EliteBenefits::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(EliteBenefits::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_elite_benefits_broker")
              .from(EliteBenefits::Table, EliteBenefits::BrokerId)
              .to(Brokers::Table, Brokers::UserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_elite_benefits_broker")
          .table(EliteBenefits::Table)
          .col(EliteBenefits::BrokerId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(EliteBenefits::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum EliteBenefits {
  Table,
  Id,
  BrokerId,
  PropertyId,
  BenefitType,
  OwnershipBps,
  WeeksBonus,
  AmountMicro,
  Status,
  CreatedAt,
}
