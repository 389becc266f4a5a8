use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use crate::addons::{AddonComponent, AddonInput};
use crate::container_runtime::{ContainerRuntime, ContainerRuntimeInput};
use crate::networking::{AutoDetection, NetworkInput, Networking};
use crate::nodes::{NodeDescriptor, NodeInput};
use crate::utils::{ArrayInput, LabelEntry};

/// Address the cluster is reachable at from outside
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ExternalIp {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

/// CNI values collected by the cluster form
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CniInput {
    pub cni_type: String,
    pub calico_version: String,
    #[serde(default)]
    pub calico_mode: Option<String>,
    #[serde(rename = "IPManger", default)]
    pub ip_manager: bool,
    #[serde(default)]
    pub mtu: Option<u32>,
}

/// Snapshot of every value of the cluster creation form, taken at submission time
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterFormValues {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub region: String,
    #[serde(default)]
    pub backup_point: String,
    #[serde(rename = "externalIP", default)]
    pub external_ip: ExternalIp,
    /// `host` or `host:port`
    #[serde(default)]
    pub external_domain: Option<String>,
    #[serde(default)]
    pub labels: Vec<LabelEntry>,
    #[serde(default)]
    pub offline: bool,
    #[serde(default)]
    pub local_registry: Option<String>,
    pub kubernetes_version: String,
    #[serde(rename = "certSANs", default)]
    pub cert_sans: Option<ArrayInput>,
    pub etcd_data_dir: String,
    pub kubelet_data_dir: String,
    #[serde(default)]
    pub ip_as_name: bool,
    #[serde(flatten)]
    pub nodes: NodeInput,
    #[serde(flatten)]
    pub runtime: ContainerRuntimeInput,
    #[serde(flatten)]
    pub network: NetworkInput,
    #[serde(flatten)]
    pub cni: CniInput,
    #[serde(flatten)]
    pub addons: AddonInput,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Provider {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct KubeProxy {}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Etcd {
    pub data_dir: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Kubelet {
    pub root_dir: String,
    pub ip_as_name: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CalicoConfig {
    #[serde(flatten)]
    pub auto_detection: AutoDetection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(rename = "IPManger")]
    pub ip_manager: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Cni {
    #[serde(rename = "type")]
    pub cni_type: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calico: Option<CalicoConfig>,
}

/// Cluster provisioning document handed to the persistence layer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterManifest {
    pub kind: String,
    pub api_version: String,
    pub metadata: ObjectMeta,
    pub provider: Provider,
    #[serde(rename = "certSANs")]
    pub cert_sans: Vec<String>,
    pub masters: Vec<NodeDescriptor>,
    pub workers: Vec<NodeDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_registry: Option<String>,
    pub kubernetes_version: String,
    pub container_runtime: ContainerRuntime,
    pub networking: Networking,
    pub kube_proxy: KubeProxy,
    pub etcd: Etcd,
    pub kubelet: Kubelet,
    pub cni: Cni,
    pub addons: Vec<AddonComponent>,
}
