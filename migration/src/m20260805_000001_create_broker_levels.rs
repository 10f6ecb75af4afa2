use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(BrokerLevels::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(BrokerLevels::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(BrokerLevels::Tag)
              .string()
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(BrokerLevels::DisplayName).string().not_null())
          .col(ColumnDef::new(BrokerLevels::Rank).integer().not_null())
          .col(
            ColumnDef::new(BrokerLevels::DirectRateBps).integer().not_null(),
          )
          .col(
            ColumnDef::new(BrokerLevels::MinWeeksSold)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(BrokerLevels::MinAffiliates)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(BrokerLevels::RetirementBonusBps).integer().null(),
          )
          .col(
            ColumnDef::new(BrokerLevels::CreatedAt)
              .date_time()
              .not_null()
              .default(Expr::current_timestamp()),
          )
          .to_owned(),
      )
      .await?;

    // Seed the three-tier ladder
    let seed = Query::insert()
      .into_table(BrokerLevels::Table)
      .columns([
        BrokerLevels::Id,
        BrokerLevels::Tag,
        BrokerLevels::DisplayName,
        BrokerLevels::Rank,
        BrokerLevels::DirectRateBps,
        BrokerLevels::MinWeeksSold,
        BrokerLevels::MinAffiliates,
        BrokerLevels::RetirementBonusBps,
      ])
      .values_panic([
        1.into(),
        "BROKER".into(),
        "Broker".into(),
        1.into(),
        400.into(),
        0.into(),
        0.into(),
        Option::<i32>::None.into(),
      ])
      .values_panic([
        2.into(),
        "SILVER_BROKER".into(),
        "Silver Broker".into(),
        2.into(),
        500.into(),
        25.into(),
        5.into(),
        Option::<i32>::None.into(),
      ])
      .values_panic([
        3.into(),
        "BROKER_ELITE".into(),
        "Broker Elite".into(),
        3.into(),
        600.into(),
        100.into(),
        20.into(),
        Some(100).into(),
      ])
      .to_owned();

    manager.exec_stmt(seed).await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(BrokerLevels::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum BrokerLevels {
  Table,
  Id,
  Tag,
  DisplayName,
  Rank,
  DirectRateBps,
  MinWeeksSold,
  MinAffiliates,
  RetirementBonusBps,
  CreatedAt,
}
