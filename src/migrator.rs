use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_branches_table::Migration),
            Box::new(m20240101_000002_create_categories_table::Migration),
            Box::new(m20240101_000003_create_departments_table::Migration),
            Box::new(m20240101_000004_create_employees_table::Migration),
            Box::new(m20240101_000005_create_users_table::Migration),
            Box::new(m20240101_000006_create_products_table::Migration),
            Box::new(m20240101_000007_create_product_assignments_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_branches_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_branches_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Branches::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Branches::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Branches::Name).string().not_null())
                        .col(ColumnDef::new(Branches::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Branches::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_branches_name")
                        .table(Branches::Table)
                        .col(Branches::Name)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Branches::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Branches {
        Table,
        Id,
        Name,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_categories_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_categories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(ColumnDef::new(Categories::Description).string().null())
                        .col(ColumnDef::new(Categories::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Categories::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_categories_name")
                        .table(Categories::Table)
                        .col(Categories::Name)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Categories {
        Table,
        Id,
        Name,
        Description,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_departments_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_departments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Departments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Departments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Departments::Name).string().not_null())
                        .col(ColumnDef::new(Departments::Description).string().null())
                        .col(
                            ColumnDef::new(Departments::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Departments::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_departments_name")
                        .table(Departments::Table)
                        .col(Departments::Name)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Departments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Departments {
        Table,
        Id,
        Name,
        Description,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_employees_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_employees_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Employees::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Employees::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Employees::EmpId).string().not_null())
                        .col(ColumnDef::new(Employees::Name).string().not_null())
                        .col(ColumnDef::new(Employees::Email).string().null())
                        .col(ColumnDef::new(Employees::Department).string().null())
                        .col(ColumnDef::new(Employees::Position).string().null())
                        .col(ColumnDef::new(Employees::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Employees::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // Badge numbers identify employees across the org
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_employees_emp_id")
                        .table(Employees::Table)
                        .col(Employees::EmpId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Employees::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Employees {
        Table,
        Id,
        EmpId,
        Name,
        Email,
        Department,
        Position,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_users_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Username).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Users::Role)
                                .string()
                                .not_null()
                                .default("user"),
                        )
                        .col(
                            ColumnDef::new(Users::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Users::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_username")
                        .table(Users::Table)
                        .col(Users::Username)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Username,
        PasswordHash,
        Role,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000006_create_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Model).string().not_null())
                        .col(ColumnDef::new(Products::CategoryId).uuid().not_null())
                        .col(ColumnDef::new(Products::BranchId).uuid().not_null())
                        .col(ColumnDef::new(Products::DepartmentId).uuid().null())
                        .col(ColumnDef::new(Products::WarrantyDate).timestamp().null())
                        .col(
                            ColumnDef::new(Products::ComplianceStatus)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Products::Notes).string().null())
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category_id")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_branch_id")
                        .table(Products::Table)
                        .col(Products::BranchId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_created_at")
                        .table(Products::Table)
                        .col(Products::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Name,
        Model,
        CategoryId,
        BranchId,
        DepartmentId,
        WarrantyDate,
        ComplianceStatus,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000007_create_product_assignments_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_product_assignments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductAssignments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductAssignments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductAssignments::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductAssignments::EmployeeId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductAssignments::AssignedById)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductAssignments::AssignedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductAssignments::ReturnedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductAssignments::ExpectedReturnAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductAssignments::Status)
                                .string()
                                .not_null()
                                .default("ASSIGNED"),
                        )
                        .col(ColumnDef::new(ProductAssignments::Condition).string().null())
                        .col(ColumnDef::new(ProductAssignments::Notes).string().null())
                        .col(
                            ColumnDef::new(ProductAssignments::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductAssignments::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            // The open-assignment lookup filters by product + status + returned_at
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_assignments_product_id")
                        .table(ProductAssignments::Table)
                        .col(ProductAssignments::ProductId)
                        .col(ProductAssignments::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_assignments_employee_id")
                        .table(ProductAssignments::Table)
                        .col(ProductAssignments::EmployeeId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_assignments_status")
                        .table(ProductAssignments::Table)
                        .col(ProductAssignments::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_assignments_assigned_at")
                        .table(ProductAssignments::Table)
                        .col(ProductAssignments::AssignedAt)
                        .to_owned(),
                )
                .await?;

            // At most one open assignment per product, enforced by the
            // database so concurrent assigns cannot both slip past the
            // service-level check. Partial unique indexes share this syntax
            // on SQLite and Postgres.
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_product_assignments_open \
                     ON product_assignments (product_id) WHERE status = 'ASSIGNED'",
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductAssignments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductAssignments {
        Table,
        Id,
        ProductId,
        EmployeeId,
        AssignedById,
        AssignedAt,
        ReturnedAt,
        ExpectedReturnAt,
        Status,
        Condition,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}
