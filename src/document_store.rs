use kube::api::{Api, ApiResource, DynamicObject, PostParams};
use kube::{Client, ResourceExt};
use serde::Serialize;
use tracing::{error, info};

use crate::backup_schedule::BackupSchedule;
use crate::cluster::ClusterManifest;
use crate::{constants, model::Error};

/// Document accepted by the persistence layer
pub trait Document: Serialize {
    const KIND: &'static str;
    const PLURAL: &'static str;

    fn document_name(&self) -> String;

    fn api_resource() -> ApiResource {
        ApiResource {
            group: constants::API_GROUP.to_owned(),
            version: "v1".to_owned(),
            api_version: constants::API_VERSION.to_owned(),
            kind: Self::KIND.to_owned(),
            plural: Self::PLURAL.to_owned(),
        }
    }

    fn to_dynamic_object(&self) -> Result<DynamicObject, Error> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }
}

impl Document for ClusterManifest {
    const KIND: &'static str = constants::CLUSTER_KIND;
    const PLURAL: &'static str = constants::CLUSTER_PLURAL;

    fn document_name(&self) -> String {
        self.metadata.name.clone().unwrap_or_default()
    }
}

impl Document for BackupSchedule {
    const KIND: &'static str = constants::CRON_BACKUP_KIND;
    const PLURAL: &'static str = constants::CRON_BACKUP_PLURAL;

    fn document_name(&self) -> String {
        self.metadata.name.clone().unwrap_or_default()
    }
}

/// Persistence collaborator. `create` is called once per successful build and never retried.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn create<D: Document + Sync>(&self, document: &D) -> Result<DynamicObject, Error>;
}

/// Stores documents as cluster scoped objects through the Kubernetes API
#[derive(Clone)]
pub struct KubeDocumentStore {
    client: Client,
}

impl KubeDocumentStore {
    pub fn new(client: Client) -> Self {
        KubeDocumentStore { client }
    }
}

impl DocumentStore for KubeDocumentStore {
    async fn create<D: Document + Sync>(&self, document: &D) -> Result<DynamicObject, Error> {
        let api_resource = D::api_resource();
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &api_resource);
        let object = document.to_dynamic_object()?;
        match api.create(&PostParams::default(), &object).await {
            Ok(created) => {
                info!("{} {} created", D::KIND, created.name_any());
                Ok(created)
            }
            Err(err) => {
                error!("Could not create {} {}: {:?}", D::KIND, document.document_name(), err);
                Err(Error::from(err))
            }
        }
    }
}
