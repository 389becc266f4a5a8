use serde::{Deserialize, Serialize};

use crate::utils::{self, ArrayInput};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntimeType {
    Docker,
    Containerd,
}

/// Runtime values collected by the cluster form, for both runtimes
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRuntimeInput {
    pub container_runtime_type: ContainerRuntimeType,
    #[serde(default)]
    pub docker_version: Option<String>,
    #[serde(default)]
    pub docker_insecure_registry: Option<ArrayInput>,
    #[serde(default)]
    pub docker_root_dir: Option<String>,
    #[serde(default)]
    pub containerd_version: Option<String>,
    #[serde(default)]
    pub containerd_insecure_registry: Option<ArrayInput>,
    #[serde(default)]
    pub containerd_root_dir: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSettings {
    pub version: Option<String>,
    pub insecure_registry: Vec<String>,
    pub root_dir: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContainerRuntime {
    Docker(RuntimeSettings),
    Containerd(RuntimeSettings),
}

impl ContainerRuntime {
    pub fn runtime_type(&self) -> ContainerRuntimeType {
        match self {
            ContainerRuntime::Docker(_) => ContainerRuntimeType::Docker,
            ContainerRuntime::Containerd(_) => ContainerRuntimeType::Containerd,
        }
    }

    pub fn settings(&self) -> &RuntimeSettings {
        match self {
            ContainerRuntime::Docker(settings) | ContainerRuntime::Containerd(settings) => settings,
        }
    }
}

/// Keeps the selected runtime's version, registries and root dir. The other runtime's fields are dropped.
pub fn resolve_container_runtime(input: &ContainerRuntimeInput) -> ContainerRuntime {
    match input.container_runtime_type {
        ContainerRuntimeType::Docker => ContainerRuntime::Docker(RuntimeSettings {
            version: input.docker_version.clone(),
            insecure_registry: utils::array_input_value(input.docker_insecure_registry.as_ref()),
            root_dir: input.docker_root_dir.clone(),
        }),
        ContainerRuntimeType::Containerd => ContainerRuntime::Containerd(RuntimeSettings {
            version: input.containerd_version.clone(),
            insecure_registry: utils::array_input_value(input.containerd_insecure_registry.as_ref()),
            root_dir: input.containerd_root_dir.clone(),
        }),
    }
}
