use crate::{
    db::DbPool,
    entities::{assignment, branch, category, employee, product, AssignmentStatus},
    errors::ServiceError,
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

const RECENT_ACTIVITY_LIMIT: u64 = 10;
const TREND_DAYS: u64 = 7;

/// Read-only aggregation over the registry and assignment history, computed
/// with database queries rather than by the client.
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DbPool>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DashboardPayload {
    pub summary: DashboardSummary,
    pub weekly_trend: Vec<TrendPoint>,
    pub recent_activities: Vec<RecentActivity>,
    pub category_distribution: Vec<CategorySlice>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DashboardSummary {
    pub total_products: u64,
    pub assigned_products: u64,
    pub available_products: u64,
    pub total_categories: u64,
    pub total_branches: u64,
    pub total_employees: u64,
}

/// Assignments opened on one calendar day.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RecentActivity {
    pub assignment_id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub employee_id: Uuid,
    pub employee_name: Option<String>,
    pub status: String,
    pub assigned_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CategorySlice {
    pub category_id: Uuid,
    pub category_name: Option<String>,
    pub count: u64,
}

impl DashboardService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardPayload, ServiceError> {
        Ok(DashboardPayload {
            summary: self.summary().await?,
            weekly_trend: self.weekly_trend().await?,
            recent_activities: self.recent_activities().await?,
            category_distribution: self.category_distribution().await?,
        })
    }

    async fn summary(&self) -> Result<DashboardSummary, ServiceError> {
        let total_products = product::Entity::find().count(&*self.db).await?;

        // A product has at most one open assignment, so counting open rows
        // counts assigned products.
        let assigned_products = assignment::Entity::find()
            .filter(assignment::Column::Status.eq(AssignmentStatus::Assigned.to_string()))
            .filter(assignment::Column::ReturnedAt.is_null())
            .count(&*self.db)
            .await?;

        let total_categories = category::Entity::find().count(&*self.db).await?;
        let total_branches = branch::Entity::find().count(&*self.db).await?;
        let total_employees = employee::Entity::find().count(&*self.db).await?;

        Ok(DashboardSummary {
            total_products,
            assigned_products,
            available_products: total_products.saturating_sub(assigned_products),
            total_categories,
            total_branches,
            total_employees,
        })
    }

    /// Assignments created per day over the trailing week, zero-filled so the
    /// chart always has seven points.
    async fn weekly_trend(&self) -> Result<Vec<TrendPoint>, ServiceError> {
        let today = Utc::now().date_naive();
        let window_start = today
            .checked_sub_days(Days::new(TREND_DAYS - 1))
            .unwrap_or(today);
        let window_start_at = window_start
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc();

        let recent = assignment::Entity::find()
            .filter(assignment::Column::AssignedAt.gte(window_start_at))
            .all(&*self.db)
            .await?;

        let mut buckets: HashMap<NaiveDate, u64> = HashMap::new();
        for row in &recent {
            *buckets.entry(row.assigned_at.date_naive()).or_insert(0) += 1;
        }

        let mut trend = Vec::with_capacity(TREND_DAYS as usize);
        for offset in 0..TREND_DAYS {
            let date = window_start
                .checked_add_days(Days::new(offset))
                .unwrap_or(window_start);
            trend.push(TrendPoint {
                date,
                count: buckets.get(&date).copied().unwrap_or(0),
            });
        }
        Ok(trend)
    }

    async fn recent_activities(&self) -> Result<Vec<RecentActivity>, ServiceError> {
        let recent = assignment::Entity::find()
            .order_by_desc(assignment::Column::AssignedAt)
            .limit(RECENT_ACTIVITY_LIMIT)
            .all(&*self.db)
            .await?;

        let product_ids: Vec<Uuid> = recent.iter().map(|a| a.product_id).collect();
        let employee_ids: Vec<Uuid> = recent.iter().map(|a| a.employee_id).collect();

        let products: HashMap<Uuid, String> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            product::Entity::find()
                .filter(product::Column::Id.is_in(product_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect()
        };
        let employees: HashMap<Uuid, String> = if employee_ids.is_empty() {
            HashMap::new()
        } else {
            employee::Entity::find()
                .filter(employee::Column::Id.is_in(employee_ids))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|e| (e.id, e.name))
                .collect()
        };

        Ok(recent
            .into_iter()
            .map(|a| RecentActivity {
                assignment_id: a.id,
                product_name: products.get(&a.product_id).cloned(),
                product_id: a.product_id,
                employee_name: employees.get(&a.employee_id).cloned(),
                employee_id: a.employee_id,
                status: a.status,
                assigned_at: a.assigned_at,
                returned_at: a.returned_at,
            })
            .collect())
    }

    async fn category_distribution(&self) -> Result<Vec<CategorySlice>, ServiceError> {
        let counts: Vec<(Uuid, i64)> = product::Entity::find()
            .select_only()
            .column(product::Column::CategoryId)
            .column_as(product::Column::Id.count(), "count")
            .group_by(product::Column::CategoryId)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let names: HashMap<Uuid, String> = category::Entity::find()
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(counts
            .into_iter()
            .map(|(category_id, count)| CategorySlice {
                category_name: names.get(&category_id).cloned(),
                category_id,
                count: count.max(0) as u64,
            })
            .collect())
    }
}
