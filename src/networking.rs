use serde::{Deserialize, Serialize};

use crate::{constants, model::Error};

/// IP family selection. Anything other than `IPv4` is handled as dual-stack and kept verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum IpFamily {
    IPv4,
    DualStack(String),
}

impl From<String> for IpFamily {
    fn from(selection: String) -> Self {
        if selection == constants::IP_FAMILY_IPV4 {
            IpFamily::IPv4
        } else {
            IpFamily::DualStack(selection)
        }
    }
}

impl From<IpFamily> for String {
    fn from(family: IpFamily) -> Self {
        match family {
            IpFamily::IPv4 => constants::IP_FAMILY_IPV4.to_owned(),
            IpFamily::DualStack(selection) => selection,
        }
    }
}

/// Interface auto-detection strategy used by the CNI
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AutoDetectionMethod {
    #[default]
    FirstFound,
    CanReach,
    Interface,
    SkipInterface,
}

impl AutoDetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoDetectionMethod::FirstFound => constants::AUTO_DETECTION_FIRST_FOUND,
            AutoDetectionMethod::CanReach => "can-reach",
            AutoDetectionMethod::Interface => "interface",
            AutoDetectionMethod::SkipInterface => "skip-interface",
        }
    }

    /// Renders the rule as understood by the CNI, `first-found` or `<method>=<value>`
    pub fn to_rule(&self, value: Option<&str>) -> String {
        match self {
            AutoDetectionMethod::FirstFound => self.as_str().to_owned(),
            _ => format!("{}={}", self.as_str(), value.unwrap_or_default()),
        }
    }
}

/// Networking values collected by the cluster form
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInput {
    #[serde(rename = "IPVersion")]
    pub ip_version: IpFamily,
    pub service_subnet: String,
    #[serde(default)]
    pub service_subnet_v6: Option<String>,
    #[serde(rename = "podIPv4CIDR")]
    pub pod_ipv4_cidr: String,
    #[serde(rename = "podIPv6CIDR", default)]
    pub pod_ipv6_cidr: Option<String>,
    pub dns_domain: String,
    #[serde(default)]
    pub worker_node_vip: Option<String>,
    pub proxy_mode: String,
    #[serde(rename = "IPv4AutoDetection", default)]
    pub ipv4_auto_detection: AutoDetectionMethod,
    #[serde(rename = "IPv4AutoDetectionValue", default)]
    pub ipv4_auto_detection_value: Option<String>,
    #[serde(rename = "IPv6AutoDetection", default)]
    pub ipv6_auto_detection: AutoDetectionMethod,
    #[serde(rename = "IPv6AutoDetectionValue", default)]
    pub ipv6_auto_detection_value: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CidrBlocks {
    pub cidr_blocks: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Networking {
    pub ip_family: IpFamily,
    pub services: CidrBlocks,
    pub dns_domain: String,
    pub pods: CidrBlocks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_node_vip: Option<String>,
    pub proxy_mode: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AutoDetection {
    #[serde(rename = "IPv4AutoDetection")]
    pub ipv4: String,
    #[serde(rename = "IPv6AutoDetection")]
    pub ipv6: String,
}

fn cidr_blocks(family: &IpFamily, v4: &str, v6: Option<&str>, v6_field: &str) -> Result<Vec<String>, Error> {
    match family {
        IpFamily::IPv4 => Ok(vec![v4.to_owned()]),
        IpFamily::DualStack(selection) => match v6.map(str::trim).filter(|v6| !v6.is_empty()) {
            Some(v6) => Ok(vec![v4.to_owned(), v6.to_owned()]),
            None => Err(Error::IncompleteNetwork(format!("{v6_field} is required for IP family {selection}"))),
        },
    }
}

/// Picks the active CIDR blocks for the selected IP family. Dual-stack needs both v6 blocks.
pub fn resolve_networking(input: &NetworkInput) -> Result<Networking, Error> {
    Ok(Networking {
        ip_family: input.ip_version.clone(),
        services: CidrBlocks {
            cidr_blocks: cidr_blocks(&input.ip_version, &input.service_subnet, input.service_subnet_v6.as_deref(), "serviceSubnetV6")?,
        },
        dns_domain: input.dns_domain.to_owned(),
        pods: CidrBlocks {
            cidr_blocks: cidr_blocks(&input.ip_version, &input.pod_ipv4_cidr, input.pod_ipv6_cidr.as_deref(), "podIPv6CIDR")?,
        },
        worker_node_vip: input.worker_node_vip.clone(),
        proxy_mode: input.proxy_mode.to_owned(),
    })
}

/// Both families' rules are always computed, whatever the selected family is
pub fn compute_auto_detection(input: &NetworkInput) -> AutoDetection {
    AutoDetection {
        ipv4: input.ipv4_auto_detection.to_rule(input.ipv4_auto_detection_value.as_deref()),
        ipv6: input.ipv6_auto_detection.to_rule(input.ipv6_auto_detection_value.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network_input(family: &str) -> NetworkInput {
        serde_yaml::from_str(&format!(
            r#"
IPVersion: {family}
serviceSubnet: 10.96.0.0/12
serviceSubnetV6: fd03::/112
podIPv4CIDR: 172.25.0.0/16
podIPv6CIDR: fd05::/120
dnsDomain: cluster.local
workerNodeVip: 169.254.169.100
proxyMode: ipvs
IPv4AutoDetection: can-reach
IPv4AutoDetectionValue: 8.8.8.8
"#
        ))
        .unwrap()
    }

    #[test]
    fn ipv4_keeps_single_block() {
        let networking = resolve_networking(&network_input("IPv4")).unwrap();
        assert_eq!(networking.services.cidr_blocks, vec!["10.96.0.0/12"]);
        assert_eq!(networking.pods.cidr_blocks, vec!["172.25.0.0/16"]);
        assert_eq!(networking.ip_family, IpFamily::IPv4);
    }

    #[test]
    fn any_other_family_is_dual_stack() {
        for family in ["IPv4+IPv6", "IPv6"] {
            let networking = resolve_networking(&network_input(family)).unwrap();
            assert_eq!(networking.services.cidr_blocks, vec!["10.96.0.0/12", "fd03::/112"]);
            assert_eq!(networking.pods.cidr_blocks, vec!["172.25.0.0/16", "fd05::/120"]);
            assert_eq!(networking.ip_family, IpFamily::DualStack(family.to_owned()));
        }
    }

    #[test]
    fn dual_stack_requires_v6_blocks() {
        let mut input = network_input("IPv4+IPv6");
        input.pod_ipv6_cidr = None;
        assert!(matches!(resolve_networking(&input), Err(Error::IncompleteNetwork(_))));

        let mut input = network_input("IPv4+IPv6");
        input.service_subnet_v6 = Some(" ".to_owned());
        assert!(matches!(resolve_networking(&input), Err(Error::IncompleteNetwork(_))));

        let mut input = network_input("IPv4");
        input.service_subnet_v6 = None;
        input.pod_ipv6_cidr = None;
        assert_eq!(resolve_networking(&input).unwrap().pods.cidr_blocks, vec!["172.25.0.0/16"]);
    }

    #[test]
    fn family_survives_serialization() {
        let networking = resolve_networking(&network_input("IPv4+IPv6")).unwrap();
        let value = serde_json::to_value(&networking).unwrap();
        assert_eq!(value["ipFamily"], "IPv4+IPv6");
        let restored: Networking = serde_json::from_value(value).unwrap();
        assert_eq!(restored.ip_family, networking.ip_family);
        assert_eq!(resolve_networking(&network_input("IPv4")).unwrap().ip_family, IpFamily::from("IPv4".to_owned()));
    }

    #[test]
    fn auto_detection_ignores_family() {
        let v4_only = compute_auto_detection(&network_input("IPv4"));
        let dual = compute_auto_detection(&network_input("IPv4+IPv6"));
        assert_eq!(v4_only, dual);
        assert_eq!(v4_only.ipv4, "can-reach=8.8.8.8");
        assert_eq!(v4_only.ipv6, "first-found");
    }
}
