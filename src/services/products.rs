use crate::{
    db::DbPool,
    entities::{assignment, branch, category, department, employee, product, AssignmentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::AssignmentService,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use qrcode::render::svg;
use qrcode::QrCode;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Service for the asset registry.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    assignments: AssignmentService,
    /// Base URL baked into generated QR codes
    public_base_url: String,
}

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub model: String,
    pub category_id: Uuid,
    pub branch_id: Uuid,
    pub department_id: Option<Uuid>,
    pub warranty_date: Option<DateTime<Utc>>,
    pub compliance_status: Option<bool>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub model: Option<String>,
    pub category_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub warranty_date: Option<DateTime<Utc>>,
    pub compliance_status: Option<bool>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Product detail payload: the row plus facts derived from its assignments.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: product::Model,
    pub is_assigned: bool,
    pub current_assignment: Option<CurrentAssignment>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CurrentAssignment {
    #[serde(flatten)]
    pub assignment: assignment::Model,
    pub employee: Option<employee::Model>,
}

/// Result of QR generation; the field is mandatory so a success response can
/// never omit it.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QrCodePayload {
    pub qr_code: String,
}

impl ProductService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        assignments: AssignmentService,
        public_base_url: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            assignments,
            public_base_url,
        }
    }

    /// Create a product. Referenced directory rows must exist.
    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateProductInput) -> Result<product::Model, ServiceError> {
        self.check_references(
            Some(input.category_id),
            Some(input.branch_id),
            input.department_id,
        )
        .await?;

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.clone()),
            model: Set(input.model.clone()),
            category_id: Set(input.category_id),
            branch_id: Set(input.branch_id),
            department_id: Set(input.department_id),
            warranty_date: Set(input.warranty_date),
            compliance_status: Set(input.compliance_status.unwrap_or(false)),
            notes: Set(input.notes.clone()),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;

        info!(product_id = %created.id, "Created product");
        Ok(created)
    }

    /// List products with free-text search over name and model.
    pub async fn list(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
        search: Option<String>,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let (page, limit) = super::normalize_page(page, limit);

        let mut condition = Condition::all();
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", term.trim());
            condition = condition.add(
                Condition::any()
                    .add(product::Column::Name.like(pattern.clone()))
                    .add(product::Column::Model.like(pattern)),
            );
        }

        let paginator = product::Entity::find()
            .filter(condition)
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok((items, total))
    }

    pub async fn get(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Product detail with the derived assignment facts.
    pub async fn detail(&self, product_id: Uuid) -> Result<ProductDetail, ServiceError> {
        let model = self.get(product_id).await?;

        let open = self.assignments.open_assignment_for_product(product_id).await?;
        let current_assignment = match open {
            Some(assignment) => {
                let employee = employee::Entity::find_by_id(assignment.employee_id)
                    .one(&*self.db)
                    .await?;
                Some(CurrentAssignment {
                    assignment,
                    employee,
                })
            }
            None => None,
        };

        Ok(ProductDetail {
            is_assigned: current_assignment.is_some(),
            current_assignment,
            product: model,
        })
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        self.check_references(input.category_id, input.branch_id, input.department_id)
            .await?;

        let existing = self.get(product_id).await?;
        let mut active: product::ActiveModel = existing.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(model) = input.model {
            active.model = Set(model);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(branch_id) = input.branch_id {
            active.branch_id = Set(branch_id);
        }
        if let Some(department_id) = input.department_id {
            active.department_id = Set(Some(department_id));
        }
        if let Some(warranty_date) = input.warranty_date {
            active.warranty_date = Set(Some(warranty_date));
        }
        if let Some(compliance_status) = input.compliance_status {
            active.compliance_status = Set(compliance_status);
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(updated.id))
            .await;

        Ok(updated)
    }

    /// Delete a product. Refused while it is out on an open assignment.
    #[instrument(skip(self))]
    pub async fn delete(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(product_id).await?;

        if self
            .assignments
            .open_assignment_for_product(product_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "Product has an open assignment and cannot be deleted".to_string(),
            ));
        }

        product::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;

        info!(product_id = %product_id, "Deleted product");
        Ok(())
    }

    /// Products currently out on an open assignment.
    pub async fn assigned(&self) -> Result<Vec<product::Model>, ServiceError> {
        let open = assignment::Entity::find()
            .filter(assignment::Column::Status.eq(AssignmentStatus::Assigned.to_string()))
            .filter(assignment::Column::ReturnedAt.is_null())
            .all(&*self.db)
            .await?;

        let product_ids: Vec<Uuid> = open.iter().map(|a| a.product_id).collect();
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    /// Render a QR code pointing at the product detail URL as an SVG data URI.
    #[instrument(skip(self))]
    pub async fn generate_qr(&self, product_id: Uuid) -> Result<QrCodePayload, ServiceError> {
        let model = self.get(product_id).await?;

        let url = format!("{}/products/{}", self.public_base_url, model.id);
        let code = QrCode::new(url.as_bytes())
            .map_err(|e| ServiceError::InternalError(format!("QR encoding failed: {}", e)))?;
        let image = code
            .render::<svg::Color>()
            .min_dimensions(240, 240)
            .build();

        Ok(QrCodePayload {
            qr_code: format!("data:image/svg+xml;base64,{}", BASE64.encode(image)),
        })
    }

    async fn check_references(
        &self,
        category_id: Option<Uuid>,
        branch_id: Option<Uuid>,
        department_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        if let Some(id) = category_id {
            category::Entity::find_by_id(id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!("Unknown category: {}", id))
                })?;
        }
        if let Some(id) = branch_id {
            branch::Entity::find_by_id(id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::ValidationError(format!("Unknown branch: {}", id)))?;
        }
        if let Some(id) = department_id {
            department::Entity::find_by_id(id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!("Unknown department: {}", id))
                })?;
        }
        Ok(())
    }
}
