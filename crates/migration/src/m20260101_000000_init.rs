//! Initial schema migration.
//!
//! - `users`: authentication and the superuser flag
//! - `funding_requests`: what needs money
//! - `contributions`: money given by users
//!
//! Both funding tables carry the same allocation columns. The allocation
//! bounds are also enforced by `CHECK` constraints so a bad write fails
//! loudly instead of corrupting the books.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    HashedPassword,
    IsSuperuser,
}

#[derive(Iden)]
enum FundingRequests {
    Table,
    Id,
    Name,
    NameNorm,
    Description,
    TargetAmount,
    AllocatedAmount,
    IsSettled,
    CreatedAt,
    SettledAt,
}

#[derive(Iden)]
enum Contributions {
    Table,
    Id,
    UserId,
    Comment,
    TargetAmount,
    AllocatedAmount,
    IsSettled,
    CreatedAt,
    SettledAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::HashedPassword).string().not_null())
                    .col(
                        ColumnDef::new(Users::IsSuperuser)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Funding requests
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FundingRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FundingRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FundingRequests::Name).string_len(100).not_null())
                    .col(ColumnDef::new(FundingRequests::NameNorm).string().not_null())
                    .col(ColumnDef::new(FundingRequests::Description).text().not_null())
                    .col(
                        ColumnDef::new(FundingRequests::TargetAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FundingRequests::AllocatedAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FundingRequests::IsSettled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FundingRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FundingRequests::SettledAt).timestamp_with_time_zone())
                    .check(Expr::col(FundingRequests::TargetAmount).gt(0))
                    .check(Expr::col(FundingRequests::AllocatedAmount).gte(0))
                    .check(
                        Expr::col(FundingRequests::AllocatedAmount)
                            .lte(Expr::col(FundingRequests::TargetAmount)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-funding_requests-name_norm-unique")
                    .table(FundingRequests::Table)
                    .col(FundingRequests::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-funding_requests-is_settled-created_at")
                    .table(FundingRequests::Table)
                    .col(FundingRequests::IsSettled)
                    .col(FundingRequests::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Contributions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Contributions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contributions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contributions::UserId).string().not_null())
                    .col(ColumnDef::new(Contributions::Comment).text())
                    .col(
                        ColumnDef::new(Contributions::TargetAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Contributions::AllocatedAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Contributions::IsSettled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Contributions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Contributions::SettledAt).timestamp_with_time_zone())
                    .check(Expr::col(Contributions::TargetAmount).gt(0))
                    .check(Expr::col(Contributions::AllocatedAmount).gte(0))
                    .check(
                        Expr::col(Contributions::AllocatedAmount)
                            .lte(Expr::col(Contributions::TargetAmount)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-contributions-user_id")
                            .from(Contributions::Table, Contributions::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-contributions-is_settled-created_at")
                    .table(Contributions::Table)
                    .col(Contributions::IsSettled)
                    .col(Contributions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-contributions-user_id")
                    .table(Contributions::Table)
                    .col(Contributions::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Contributions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FundingRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
