pub mod activity_seen;
pub mod change_orders;
pub mod collaborators;
pub mod contract_activities;
pub mod contract_archives;
pub mod contract_completions;
pub mod contracts;
pub mod decisions;
pub mod esigns;
pub mod file_assignees;
pub mod files;
pub mod payment_operations;
pub mod payments;
pub mod phases;
pub mod roles;
pub mod subscriptions;
pub mod task_versions;
pub mod tasks;
pub mod view_points;
