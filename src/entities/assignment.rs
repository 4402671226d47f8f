use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle state of an assignment.
///
/// ASSIGNED is the only open state; the other three are terminal. There is no
/// transition out of a terminal state: a closed assignment is immutable
/// history.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, utoipa::ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Assigned,
    Returned,
    Lost,
    Damaged,
}

impl AssignmentStatus {
    pub fn is_open(self) -> bool {
        self == AssignmentStatus::Assigned
    }

    /// Whether a return-style action may move an open assignment into `target`.
    pub fn can_close_to(self, target: AssignmentStatus) -> bool {
        self.is_open() && !target.is_open()
    }
}

/// Condition grade recorded when an assignment is returned.
///
/// A coarse four-point ordinal used for display only; never fed into any
/// computation.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, utoipa::ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentCondition {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Assignment entity: a time-bounded link between one product and one
/// employee, authored by a system user.
///
/// Invariant: `returned_at` is set iff `status` is not ASSIGNED, and
/// `condition` is set only when `status` is RETURNED. The service layer is
/// the only writer and maintains this.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "product_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub product_id: Uuid,

    pub employee_id: Uuid,

    /// System user who performed the assignment
    pub assigned_by_id: Uuid,

    pub assigned_at: DateTime<Utc>,

    pub returned_at: Option<DateTime<Utc>>,

    pub expected_return_at: Option<DateTime<Utc>>,

    /// One of ASSIGNED / RETURNED / LOST / DAMAGED
    pub status: String,

    /// One of EXCELLENT / GOOD / FAIR / POOR, recorded at return time
    pub condition: Option<String>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Typed view of the stored status. Unknown strings map to a database
    /// error at the call site rather than a panic.
    pub fn status(&self) -> Result<AssignmentStatus, DbErr> {
        self.status
            .parse()
            .map_err(|_| DbErr::Custom(format!("Unknown assignment status: {}", self.status)))
    }

    pub fn condition(&self) -> Result<Option<AssignmentCondition>, DbErr> {
        self.condition
            .as_deref()
            .map(|c| {
                c.parse()
                    .map_err(|_| DbErr::Custom(format!("Unknown assignment condition: {}", c)))
            })
            .transpose()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AssignedById",
        to = "super::user::Column::Id"
    )]
    AssignedBy,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedBy.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.status {
                active_model.status = Set(AssignmentStatus::Assigned.to_string());
            }
            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Some(Utc::now()));

        Ok(active_model)
    }
}
