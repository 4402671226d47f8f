pub mod idempotency;
pub mod request_id;
