use cluster_synth::backup_schedule::{self, ScheduleFormValues};
use cluster_synth::cluster::ClusterFormValues;
use cluster_synth::document_store::KubeDocumentStore;
use cluster_synth::synth_config::SynthConfig;
use cluster_synth::{manifest_builder, submit, ContextData, Error};
use kube::Client;
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn read_form<T: DeserializeOwned>(path: &str) -> Result<T, Error> {
    let form_file = std::fs::File::open(path)?;
    Ok(serde_yaml::from_reader(form_file)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let version: &str = env!("CARGO_PKG_VERSION");
    info!("Starting cluster-synth {}", version);
    let config = SynthConfig::load()?;
    let context_data = ContextData::load(&config)?;
    let store = if config.submit {
        Some(KubeDocumentStore::new(Client::try_default().await?))
    } else {
        None
    };

    if let Some(cluster_form_path) = &config.cluster_form_path {
        let values: ClusterFormValues = read_form(cluster_form_path)?;
        match &store {
            Some(store) => {
                submit::submit_cluster(store, &context_data, &values).await?;
            }
            None => {
                let manifest = manifest_builder::build_cluster_manifest(&values, &context_data)?;
                println!("---\n{}", serde_yaml::to_string(&manifest)?);
            }
        }
    }

    if let Some(backup) = &config.backup {
        let values: ScheduleFormValues = read_form(&backup.form_path)?;
        match &store {
            Some(store) => {
                submit::submit_backup_schedule(store, &backup.cluster, &values).await?;
            }
            None => {
                backup.cluster.ensure_backup_allowed()?;
                let schedule = backup_schedule::build_backup_schedule(&values, &backup.cluster.name)?;
                println!("---\n{}", serde_yaml::to_string(&schedule)?);
            }
        }
    }

    Ok(())
}
