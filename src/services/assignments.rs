use crate::{
    db::DbPool,
    entities::{assignment, employee, product, AssignmentCondition, AssignmentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Service for the assignment lifecycle and its query layer.
///
/// Every read path that needs to know whether a product is out goes through
/// [`AssignmentService::open_assignment_for_product`]; the predicate lives
/// here and nowhere else.
#[derive(Clone)]
pub struct AssignmentService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

/// Request body for assigning one product to one employee.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct AssignProductInput {
    pub product_id: Uuid,
    pub employee_id: Uuid,
    pub expected_return_at: Option<DateTime<Utc>>,
    #[validate(length(max = 2000, message = "Notes cannot exceed 2000 characters"))]
    pub notes: Option<String>,
}

/// Request body for assigning several products to one employee.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct BulkAssignInput {
    #[validate(length(min = 1, message = "At least one product is required"))]
    pub product_ids: Vec<Uuid>,
    pub employee_id: Uuid,
    pub expected_return_at: Option<DateTime<Utc>>,
    #[validate(length(max = 2000, message = "Notes cannot exceed 2000 characters"))]
    pub notes: Option<String>,
}

/// Per-item outcome of a bulk assign. The operation is not transactional:
/// each product either gets its own assignment row or a reason why not.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BulkAssignOutcome {
    pub assigned: Vec<assignment::Model>,
    pub failed: Vec<BulkAssignFailure>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BulkAssignFailure {
    pub product_id: Uuid,
    pub reason: String,
}

/// Request body for closing an open assignment.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct CloseAssignmentInput {
    /// Target state; defaults to RETURNED
    pub status: Option<AssignmentStatus>,
    /// Required when the target is RETURNED, rejected otherwise
    pub condition: Option<AssignmentCondition>,
    #[validate(length(max = 2000, message = "Notes cannot exceed 2000 characters"))]
    pub notes: Option<String>,
}

/// Request body for editing an open assignment.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateAssignmentInput {
    pub expected_return_at: Option<DateTime<Utc>>,
    #[validate(length(max = 2000, message = "Notes cannot exceed 2000 characters"))]
    pub notes: Option<String>,
}

/// Query parameters for the assignment history endpoint.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct AssignmentHistoryFilter {
    pub product_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub status: Option<AssignmentStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl AssignmentService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// The one definition of "this product is currently out".
    pub async fn open_assignment_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Option<assignment::Model>, ServiceError> {
        assignment::Entity::find()
            .filter(assignment::Column::ProductId.eq(product_id))
            .filter(assignment::Column::Status.eq(AssignmentStatus::Assigned.to_string()))
            .filter(assignment::Column::ReturnedAt.is_null())
            .one(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    /// Assign a product to an employee. Conflicts if the product already has
    /// an open assignment.
    #[instrument(skip(self))]
    pub async fn assign(
        &self,
        actor_id: Uuid,
        input: AssignProductInput,
    ) -> Result<assignment::Model, ServiceError> {
        product::Entity::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", input.product_id)))?;

        employee::Entity::find_by_id(input.employee_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", input.employee_id))
            })?;

        if self
            .open_assignment_for_product(input.product_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "Product is already assigned".to_string(),
            ));
        }

        let assignment = assignment::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            employee_id: Set(input.employee_id),
            assigned_by_id: Set(actor_id),
            assigned_at: Set(Utc::now()),
            returned_at: Set(None),
            expected_return_at: Set(input.expected_return_at),
            status: Set(AssignmentStatus::Assigned.to_string()),
            condition: Set(None),
            notes: Set(input.notes.clone()),
            ..Default::default()
        };

        // The partial unique index on open assignments backs this up: a
        // concurrent assign that slipped past the check above surfaces here
        // as a unique violation, not as a second open row.
        let assignment = match assignment.insert(&*self.db).await {
            Ok(assignment) => assignment,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(ServiceError::Conflict(
                    "Product is already assigned".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        self.event_sender
            .send_or_log(Event::AssignmentCreated {
                assignment_id: assignment.id,
                product_id: assignment.product_id,
                employee_id: assignment.employee_id,
            })
            .await;

        info!(assignment_id = %assignment.id, "Created assignment");
        Ok(assignment)
    }

    /// Assign several products to one employee, reporting per-item outcomes.
    #[instrument(skip(self))]
    pub async fn assign_bulk(
        &self,
        actor_id: Uuid,
        input: BulkAssignInput,
    ) -> Result<BulkAssignOutcome, ServiceError> {
        let mut outcome = BulkAssignOutcome {
            assigned: Vec::new(),
            failed: Vec::new(),
        };

        for product_id in input.product_ids {
            let item = AssignProductInput {
                product_id,
                employee_id: input.employee_id,
                expected_return_at: input.expected_return_at,
                notes: input.notes.clone(),
            };
            match self.assign(actor_id, item).await {
                Ok(assignment) => outcome.assigned.push(assignment),
                Err(e) => outcome.failed.push(BulkAssignFailure {
                    product_id,
                    reason: e.response_message(),
                }),
            }
        }

        Ok(outcome)
    }

    /// Close an open assignment as RETURNED, LOST or DAMAGED. Closed rows are
    /// immutable history; a second close is a conflict.
    #[instrument(skip(self))]
    pub async fn close(
        &self,
        assignment_id: Uuid,
        input: CloseAssignmentInput,
    ) -> Result<assignment::Model, ServiceError> {
        let existing = self.get(assignment_id).await?;
        let current = existing.status()?;

        let target = input.status.unwrap_or(AssignmentStatus::Returned);
        if target == AssignmentStatus::Assigned {
            return Err(ServiceError::ValidationError(
                "Target status must be RETURNED, LOST or DAMAGED".to_string(),
            ));
        }
        if !current.can_close_to(target) {
            return Err(ServiceError::Conflict(format!(
                "Assignment is already closed with status {}",
                existing.status
            )));
        }

        // Condition is a statement about a returned item; it has no meaning
        // for LOST or DAMAGED closures.
        match (target, input.condition) {
            (AssignmentStatus::Returned, None) => {
                return Err(ServiceError::ValidationError(
                    "Condition is required when returning a product".to_string(),
                ))
            }
            (AssignmentStatus::Returned, Some(_)) => {}
            (_, Some(_)) => {
                return Err(ServiceError::ValidationError(format!(
                    "Condition cannot be recorded for a {} closure",
                    target
                )))
            }
            (_, None) => {}
        }

        let returned_at = Utc::now();
        let mut active: assignment::ActiveModel = existing.into();
        active.status = Set(target.to_string());
        active.returned_at = Set(Some(returned_at));
        active.condition = Set(input.condition.map(|c| c.to_string()));
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }

        let assignment = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::AssignmentClosed {
                assignment_id: assignment.id,
                product_id: assignment.product_id,
                status: assignment.status.clone(),
                returned_at,
            })
            .await;

        info!(assignment_id = %assignment.id, status = %assignment.status, "Closed assignment");
        Ok(assignment)
    }

    /// Edit notes / expected return date. Only open assignments can change.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        assignment_id: Uuid,
        input: UpdateAssignmentInput,
    ) -> Result<assignment::Model, ServiceError> {
        let existing = self.get(assignment_id).await?;

        if !existing.status()?.is_open() {
            return Err(ServiceError::Conflict(
                "Closed assignments cannot be edited".to_string(),
            ));
        }

        let mut active: assignment::ActiveModel = existing.into();
        if let Some(expected) = input.expected_return_at {
            active.expected_return_at = Set(Some(expected));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }

        let assignment = active.update(&*self.db).await?;
        Ok(assignment)
    }

    pub async fn get(&self, assignment_id: Uuid) -> Result<assignment::Model, ServiceError> {
        assignment::Entity::find_by_id(assignment_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Assignment {} not found", assignment_id)))
    }

    /// All currently open assignments, newest first.
    pub async fn active(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
    ) -> Result<(Vec<assignment::Model>, u64), ServiceError> {
        let (page, limit) = super::normalize_page(page, limit);

        let paginator = assignment::Entity::find()
            .filter(assignment::Column::Status.eq(AssignmentStatus::Assigned.to_string()))
            .filter(assignment::Column::ReturnedAt.is_null())
            .order_by_desc(assignment::Column::AssignedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok((items, total))
    }

    /// Full history with optional filters. Filters become SQL conditions;
    /// nothing is filtered after the fact.
    pub async fn history(
        &self,
        filter: AssignmentHistoryFilter,
    ) -> Result<(Vec<assignment::Model>, u64), ServiceError> {
        let (page, limit) = super::normalize_page(filter.page, filter.limit);

        let mut condition = Condition::all();
        if let Some(product_id) = filter.product_id {
            condition = condition.add(assignment::Column::ProductId.eq(product_id));
        }
        if let Some(employee_id) = filter.employee_id {
            condition = condition.add(assignment::Column::EmployeeId.eq(employee_id));
        }
        if let Some(status) = filter.status {
            condition = condition.add(assignment::Column::Status.eq(status.to_string()));
        }
        if let Some(from) = filter.from_date {
            condition = condition.add(assignment::Column::AssignedAt.gte(from));
        }
        if let Some(to) = filter.to_date {
            condition = condition.add(assignment::Column::AssignedAt.lte(to));
        }

        let paginator = assignment::Entity::find()
            .filter(condition)
            .order_by_desc(assignment::Column::AssignedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok((items, total))
    }

    /// Complete assignment history for one product, newest first.
    pub async fn for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<assignment::Model>, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        assignment::Entity::find()
            .filter(assignment::Column::ProductId.eq(product_id))
            .order_by_desc(assignment::Column::AssignedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }
}
