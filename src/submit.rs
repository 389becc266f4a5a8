use kube::api::DynamicObject;
use tracing::info;

use crate::backup_schedule::{self, BackupTarget, ScheduleFormValues};
use crate::cluster::ClusterFormValues;
use crate::context_data::ContextData;
use crate::document_store::DocumentStore;
use crate::{manifest_builder, model::Error};

/// Builds the cluster manifest and hands it to the store. A failed build never reaches the store.
pub async fn submit_cluster<S: DocumentStore>(store: &S, context: &ContextData, values: &ClusterFormValues) -> Result<DynamicObject, Error> {
    let manifest = manifest_builder::build_cluster_manifest(values, context)?;
    info!("Submitting cluster {}", values.name);
    store.create(&manifest).await
}

/// Builds the backup schedule of `target` and hands it to the store
pub async fn submit_backup_schedule<S: DocumentStore>(store: &S, target: &BackupTarget, values: &ScheduleFormValues) -> Result<DynamicObject, Error> {
    target.ensure_backup_allowed()?;
    let schedule = backup_schedule::build_backup_schedule(values, &target.name)?;
    info!("Submitting backup schedule {} for cluster {}", values.name, target.name);
    store.create(&schedule).await
}
