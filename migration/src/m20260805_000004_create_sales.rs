use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Sales::Table)
          .if_not_exists()
          .col(ColumnDef::new(Sales::Id).string().not_null().primary_key())
          .col(ColumnDef::new(Sales::BuyerUserId).big_integer().not_null())
          .col(ColumnDef::new(Sales::AmountMicro).big_integer().not_null())
          .col(ColumnDef::new(Sales::Weeks).integer().not_null())
          .col(
            ColumnDef::new(Sales::Status)
              .string()
              .not_null()
              .default("requested"),
          )
          .col(ColumnDef::new(Sales::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Sales::ConfirmedAt).date_time().null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_sales_buyer")
          .table(Sales::Table)
          .col(Sales::BuyerUserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Sales::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Sales {
  Table,
  Id,
  BuyerUserId,
  AmountMicro,
  Weeks,
  Status,
  CreatedAt,
  ConfirmedAt,
}
