pub mod addons;
pub mod backup_schedule;
pub mod cluster;
pub mod constants;
pub mod container_runtime;
pub mod context_data;
pub mod cron;
pub mod document_store;
pub mod manifest_builder;
pub mod model;
pub mod networking;
pub mod nodes;
pub mod submit;
pub mod synth_config;
pub mod utils;

pub use backup_schedule::{build_backup_schedule, BackupSchedule, ScheduleFormValues};
pub use cluster::{ClusterFormValues, ClusterManifest};
pub use context_data::ContextData;
pub use manifest_builder::build_cluster_manifest;
pub use model::Error;
