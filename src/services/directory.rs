use crate::{
    db::DbPool,
    entities::{assignment, branch, category, department, employee, product, AssignmentStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// CRUD over the reference data the registry points at: branches, categories,
/// departments and employees.
#[derive(Clone)]
pub struct DirectoryService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct BranchInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct DepartmentInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
pub struct EmployeeInput {
    #[validate(length(min = 1, max = 64))]
    pub emp_id: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 255))]
    pub department: Option<String>,
    #[validate(length(max = 255))]
    pub position: Option<String>,
}

impl DirectoryService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // ---- branches ----

    #[instrument(skip(self))]
    pub async fn create_branch(&self, input: BranchInput) -> Result<branch::Model, ServiceError> {
        self.ensure_unique_branch_name(&input.name, None).await?;

        let created = branch::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.clone()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::BranchCreated(created.id))
            .await;
        info!(branch_id = %created.id, "Created branch");
        Ok(created)
    }

    pub async fn list_branches(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
        search: Option<String>,
    ) -> Result<(Vec<branch::Model>, u64), ServiceError> {
        let (page, limit) = super::normalize_page(page, limit);
        let paginator = branch::Entity::find()
            .filter(name_search(branch::Column::Name, search))
            .order_by_asc(branch::Column::Name)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        Ok((paginator.fetch_page(page - 1).await?, total))
    }

    pub async fn get_branch(&self, id: Uuid) -> Result<branch::Model, ServiceError> {
        branch::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Branch {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn update_branch(
        &self,
        id: Uuid,
        input: BranchInput,
    ) -> Result<branch::Model, ServiceError> {
        self.ensure_unique_branch_name(&input.name, Some(id)).await?;
        let existing = self.get_branch(id).await?;
        let mut active: branch::ActiveModel = existing.into();
        active.name = Set(input.name);
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_branch(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_branch(id).await?;
        let in_use = product::Entity::find()
            .filter(product::Column::BranchId.eq(id))
            .count(&*self.db)
            .await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(
                "Branch still has products and cannot be deleted".to_string(),
            ));
        }
        branch::Entity::delete_by_id(existing.id).exec(&*self.db).await?;
        Ok(())
    }

    async fn ensure_unique_branch_name(
        &self,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = branch::Entity::find().filter(branch::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(branch::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Branch '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    // ---- categories ----

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CategoryInput,
    ) -> Result<category::Model, ServiceError> {
        self.ensure_unique_category_name(&input.name, None).await?;

        let created = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(created.id))
            .await;
        info!(category_id = %created.id, "Created category");
        Ok(created)
    }

    pub async fn list_categories(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
        search: Option<String>,
    ) -> Result<(Vec<category::Model>, u64), ServiceError> {
        let (page, limit) = super::normalize_page(page, limit);
        let paginator = category::Entity::find()
            .filter(name_search(category::Column::Name, search))
            .order_by_asc(category::Column::Name)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        Ok((paginator.fetch_page(page - 1).await?, total))
    }

    pub async fn get_category(&self, id: Uuid) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: Uuid,
        input: CategoryInput,
    ) -> Result<category::Model, ServiceError> {
        self.ensure_unique_category_name(&input.name, Some(id)).await?;
        let existing = self.get_category(id).await?;
        let mut active: category::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.description = Set(input.description);
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_category(id).await?;
        let in_use = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(&*self.db)
            .await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(
                "Category still has products and cannot be deleted".to_string(),
            ));
        }
        category::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn ensure_unique_category_name(
        &self,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = category::Entity::find().filter(category::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(category::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    // ---- departments ----

    #[instrument(skip(self))]
    pub async fn create_department(
        &self,
        input: DepartmentInput,
    ) -> Result<department::Model, ServiceError> {
        self.ensure_unique_department_name(&input.name, None).await?;

        let created = department::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::DepartmentCreated(created.id))
            .await;
        info!(department_id = %created.id, "Created department");
        Ok(created)
    }

    pub async fn list_departments(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
        search: Option<String>,
    ) -> Result<(Vec<department::Model>, u64), ServiceError> {
        let (page, limit) = super::normalize_page(page, limit);
        let paginator = department::Entity::find()
            .filter(name_search(department::Column::Name, search))
            .order_by_asc(department::Column::Name)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        Ok((paginator.fetch_page(page - 1).await?, total))
    }

    pub async fn get_department(&self, id: Uuid) -> Result<department::Model, ServiceError> {
        department::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Department {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn update_department(
        &self,
        id: Uuid,
        input: DepartmentInput,
    ) -> Result<department::Model, ServiceError> {
        self.ensure_unique_department_name(&input.name, Some(id))
            .await?;
        let existing = self.get_department(id).await?;
        let mut active: department::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.description = Set(input.description);
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_department(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_department(id).await?;
        let in_use = product::Entity::find()
            .filter(product::Column::DepartmentId.eq(id))
            .count(&*self.db)
            .await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(
                "Department still has products and cannot be deleted".to_string(),
            ));
        }
        department::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn ensure_unique_department_name(
        &self,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = department::Entity::find().filter(department::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(department::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Department '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    // ---- employees ----

    #[instrument(skip(self))]
    pub async fn create_employee(
        &self,
        input: EmployeeInput,
    ) -> Result<employee::Model, ServiceError> {
        self.ensure_unique_emp_id(&input.emp_id, None).await?;

        let created = employee::ActiveModel {
            id: Set(Uuid::new_v4()),
            emp_id: Set(input.emp_id.clone()),
            name: Set(input.name.clone()),
            email: Set(input.email.clone()),
            department: Set(input.department.clone()),
            position: Set(input.position.clone()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::EmployeeCreated(created.id))
            .await;
        info!(employee_id = %created.id, "Created employee");
        Ok(created)
    }

    pub async fn list_employees(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
        search: Option<String>,
    ) -> Result<(Vec<employee::Model>, u64), ServiceError> {
        let (page, limit) = super::normalize_page(page, limit);

        let mut condition = Condition::all();
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", term.trim());
            condition = condition.add(
                Condition::any()
                    .add(employee::Column::Name.like(pattern.clone()))
                    .add(employee::Column::EmpId.like(pattern)),
            );
        }

        let paginator = employee::Entity::find()
            .filter(condition)
            .order_by_asc(employee::Column::Name)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        Ok((paginator.fetch_page(page - 1).await?, total))
    }

    pub async fn get_employee(&self, id: Uuid) -> Result<employee::Model, ServiceError> {
        employee::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn update_employee(
        &self,
        id: Uuid,
        input: EmployeeInput,
    ) -> Result<employee::Model, ServiceError> {
        self.ensure_unique_emp_id(&input.emp_id, Some(id)).await?;
        let existing = self.get_employee(id).await?;
        let mut active: employee::ActiveModel = existing.into();
        active.emp_id = Set(input.emp_id);
        active.name = Set(input.name);
        active.email = Set(input.email);
        active.department = Set(input.department);
        active.position = Set(input.position);
        Ok(active.update(&*self.db).await?)
    }

    /// Delete an employee. Refused while they hold an open assignment.
    #[instrument(skip(self))]
    pub async fn delete_employee(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_employee(id).await?;

        let open = assignment::Entity::find()
            .filter(assignment::Column::EmployeeId.eq(id))
            .filter(assignment::Column::Status.eq(AssignmentStatus::Assigned.to_string()))
            .filter(assignment::Column::ReturnedAt.is_null())
            .count(&*self.db)
            .await?;
        if open > 0 {
            return Err(ServiceError::Conflict(
                "Employee holds assigned products and cannot be deleted".to_string(),
            ));
        }

        employee::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn ensure_unique_emp_id(
        &self,
        emp_id: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = employee::Entity::find().filter(employee::Column::EmpId.eq(emp_id));
        if let Some(id) = exclude {
            query = query.filter(employee::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Employee id '{}' already exists",
                emp_id
            )));
        }
        Ok(())
    }
}

fn name_search<C: ColumnTrait>(column: C, search: Option<String>) -> Condition {
    let mut condition = Condition::all();
    if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
        condition = condition.add(column.like(format!("%{}%", term.trim())));
    }
    condition
}
