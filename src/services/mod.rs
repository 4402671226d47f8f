pub mod assignments;
pub mod dashboard;
pub mod directory;
pub mod products;
pub mod users;

pub use assignments::AssignmentService;
pub use dashboard::DashboardService;
pub use directory::DirectoryService;
pub use products::ProductService;
pub use users::UserService;

/// Default page size for list endpoints
pub const DEFAULT_LIMIT: u64 = 20;
/// Hard cap on page size
pub const MAX_LIMIT: u64 = 100;

/// Normalize (page, limit) query values: pages are 1-based, limit is clamped.
pub fn normalize_page(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_and_limit_are_normalized() {
        assert_eq!(normalize_page(None, None), (1, DEFAULT_LIMIT));
        assert_eq!(normalize_page(Some(0), Some(0)), (1, 1));
        assert_eq!(normalize_page(Some(3), Some(500)), (3, MAX_LIMIT));
    }
}
