use k8s_openapi::api::core::v1::Taint;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use crate::constants;
use crate::utils::{self, LabelEntry};

/// Node picked in the node selection step
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeEntry {
    pub id: String,
    #[serde(default)]
    pub labels: Vec<LabelEntry>,
}

/// Taint as entered in the taint list widget
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TaintEntry {
    Plain(Taint),
    Widget { value: Taint },
}

impl TaintEntry {
    pub fn taint(&self) -> &Taint {
        match self {
            TaintEntry::Plain(taint) | TaintEntry::Widget { value: taint } => taint,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NodeInput {
    pub masters: Vec<NodeEntry>,
    #[serde(default)]
    pub workers: Vec<NodeEntry>,
    /// Taints applied to every master
    #[serde(default)]
    pub taints: Vec<TaintEntry>,
    /// Labels shared by every node, overridden by the node's own labels
    #[serde(default)]
    pub node_labels: Vec<LabelEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormattedNodes {
    pub masters: Vec<NodeDescriptor>,
    pub workers: Vec<NodeDescriptor>,
}

/// Rewrites every taint key to the control-plane role once the cluster runs v1.24.0 or later.
/// Older versions keep the keys as configured.
pub fn remap_taints(taints: &[TaintEntry], kubernetes_version: &str) -> Vec<Taint> {
    let control_plane_role = utils::version_compare(constants::CONTROL_PLANE_TAINT_MIN_VERSION, kubernetes_version) != Ordering::Greater;
    taints
        .iter()
        .map(|entry| {
            let mut taint = entry.taint().clone();
            if control_plane_role {
                taint.key = constants::CONTROL_PLANE_TAINT_KEY.to_owned();
            }
            taint
        })
        .collect()
}

fn node_descriptor(node: &NodeEntry, shared_labels: &BTreeMap<String, String>, taints: &[Taint]) -> NodeDescriptor {
    let mut labels = shared_labels.clone();
    labels.extend(utils::labels_from_entries(&node.labels));
    NodeDescriptor {
        id: node.id.to_owned(),
        labels,
        taints: taints.to_vec(),
    }
}

/// Builds the master and worker descriptors. Only masters carry taints.
pub fn format_nodes(input: &NodeInput, kubernetes_version: &str) -> FormattedNodes {
    let shared_labels = utils::labels_from_entries(&input.node_labels);
    let taints = remap_taints(&input.taints, kubernetes_version);
    debug!("Formatting {} masters and {} workers", input.masters.len(), input.workers.len());
    FormattedNodes {
        masters: input.masters.iter().map(|node| node_descriptor(node, &shared_labels, &taints)).collect(),
        workers: input.workers.iter().map(|node| node_descriptor(node, &shared_labels, &[])).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_input() -> NodeInput {
        serde_yaml::from_str(
            r#"
masters:
  - id: 1b2c-master
    labels:
      - key: zone
        value: a
workers:
  - id: 9f8e-worker
taints:
  - value:
      key: node-role.kubernetes.io/master
      effect: NoSchedule
  - key: dedicated
    value: etcd
    effect: NoExecute
nodeLabels:
  - key: zone
    value: default
  - key: tier
    value: infra
"#,
        )
        .unwrap()
    }

    #[test]
    fn taint_keys_are_rewritten_from_threshold() {
        for version in ["v1.24.0", "v1.24.3", "v1.27.1"] {
            let taints = remap_taints(&node_input().taints, version);
            assert!(taints.iter().all(|taint| taint.key == constants::CONTROL_PLANE_TAINT_KEY));
            assert_eq!(taints[1].value.as_deref(), Some("etcd"));
            assert_eq!(taints[1].effect, "NoExecute");
        }
    }

    #[test]
    fn taint_keys_are_kept_below_threshold() {
        let taints = remap_taints(&node_input().taints, "v1.23.6");
        assert_eq!(taints[0].key, "node-role.kubernetes.io/master");
        assert_eq!(taints[1].key, "dedicated");
    }

    #[test]
    fn only_masters_carry_taints() {
        let nodes = format_nodes(&node_input(), "v1.23.6");
        assert_eq!(nodes.masters[0].taints.len(), 2);
        assert!(nodes.workers[0].taints.is_empty());
        let worker = serde_json::to_value(&nodes.workers[0]).unwrap();
        assert!(worker.get("taints").is_none());
    }

    #[test]
    fn node_labels_override_shared_labels() {
        let nodes = format_nodes(&node_input(), "v1.23.6");
        assert_eq!(nodes.masters[0].labels["zone"], "a");
        assert_eq!(nodes.masters[0].labels["tier"], "infra");
        assert_eq!(nodes.workers[0].labels["zone"], "default");
    }
}
