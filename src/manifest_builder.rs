use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::info;

use crate::cluster::{CalicoConfig, ClusterFormValues, ClusterManifest, Cni, Etcd, Kubelet, KubeProxy, Provider};
use crate::context_data::ContextData;
use crate::{addons, constants, container_runtime, model::Error, networking, nodes, utils};

fn build_labels(values: &ClusterFormValues) -> BTreeMap<String, String> {
    let mut labels: BTreeMap<String, String> = BTreeMap::new();
    labels.insert(constants::LABEL_REGION.to_owned(), values.region.to_owned());
    labels.insert(constants::LABEL_BACKUP_POINT.to_owned(), values.backup_point.to_owned());
    if let Some(ip) = values.external_ip.ip.as_ref().filter(|ip| !ip.is_empty()) {
        labels.insert(constants::LABEL_EXTERNAL_IP.to_owned(), ip.to_owned());
    }
    if let Some(port) = values.external_ip.port.filter(|port| *port != 0) {
        labels.insert(constants::LABEL_EXTERNAL_PORT.to_owned(), port.to_string());
    }
    let mut domain_parts = values.external_domain.as_deref().unwrap_or_default().split(':');
    if let Some(domain) = domain_parts.next().filter(|domain| !domain.is_empty()) {
        labels.insert(constants::LABEL_EXTERNAL_DOMAIN.to_owned(), domain.to_owned());
    }
    if let Some(domain_port) = domain_parts.next().filter(|port| !port.is_empty()) {
        labels.insert(constants::LABEL_EXTERNAL_DOMAIN_PORT.to_owned(), domain_port.to_owned());
    }
    labels.extend(utils::labels_from_entries(&values.labels));
    labels
}

fn build_annotations(values: &ClusterFormValues) -> BTreeMap<String, String> {
    let mut annotations: BTreeMap<String, String> = BTreeMap::new();
    annotations.insert(constants::ANNOTATION_DESCRIPTION.to_owned(), values.description.to_owned());
    if values.offline {
        annotations.insert(constants::ANNOTATION_OFFLINE.to_owned(), String::new());
    }
    annotations
}

fn build_cni(values: &ClusterFormValues) -> Cni {
    let calico = if values.cni.cni_type == constants::DEFAULT_CNI {
        Some(CalicoConfig {
            auto_detection: networking::compute_auto_detection(&values.network),
            mode: values.cni.calico_mode.clone(),
            ip_manager: values.cni.ip_manager,
            mtu: values.cni.mtu,
        })
    } else {
        None
    };
    Cni {
        cni_type: values.cni.cni_type.to_owned(),
        version: values.cni.calico_version.to_owned(),
        calico,
    }
}

/// Builds the cluster manifest from a snapshot of the creation form.
///
/// Nothing is returned unless every section resolves. An enabled add-on missing from the catalog
/// fails the whole build.
pub fn build_cluster_manifest(values: &ClusterFormValues, context: &ContextData) -> Result<ClusterManifest, Error> {
    let addons = addons::encode_addons(&values.addons, &context.catalog, context.encoder.as_ref())?;
    let nodes = nodes::format_nodes(&values.nodes, &values.kubernetes_version);

    let manifest = ClusterManifest {
        kind: constants::CLUSTER_KIND.to_owned(),
        api_version: constants::API_VERSION.to_owned(),
        metadata: ObjectMeta {
            name: Some(values.name.to_owned()),
            labels: Some(build_labels(values)),
            annotations: Some(build_annotations(values)),
            ..ObjectMeta::default()
        },
        provider: Provider {
            name: constants::PROVIDER_NAME.to_owned(),
        },
        cert_sans: utils::array_input_value(values.cert_sans.as_ref()),
        masters: nodes.masters,
        workers: nodes.workers,
        local_registry: values.local_registry.clone(),
        kubernetes_version: values.kubernetes_version.to_owned(),
        container_runtime: container_runtime::resolve_container_runtime(&values.runtime),
        networking: networking::resolve_networking(&values.network)?,
        kube_proxy: KubeProxy::default(),
        etcd: Etcd {
            data_dir: values.etcd_data_dir.to_owned(),
        },
        kubelet: Kubelet {
            root_dir: values.kubelet_data_dir.to_owned(),
            ip_as_name: values.ip_as_name,
        },
        cni: build_cni(values),
        addons,
    };
    info!("Cluster manifest {} built with {} add-ons", values.name, manifest.addons.len());
    Ok(manifest)
}
