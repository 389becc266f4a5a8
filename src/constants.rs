// Synthesizer Constants
pub const SYNTH_ENVIRONMENT: &str = "SYNTH_ENVIRONMENT";
pub const PRODUCTION_CONFIG_PATH: &str = "/app/config/config.yaml";

// Documents
pub const API_GROUP: &str = "core.kubeclipper.io";
pub const API_VERSION: &str = "core.kubeclipper.io/v1";
pub const CLUSTER_KIND: &str = "Cluster";
pub const CLUSTER_PLURAL: &str = "clusters";
pub const CRON_BACKUP_KIND: &str = "CronBackup";
pub const CRON_BACKUP_PLURAL: &str = "cronbackups";
pub const PROVIDER_NAME: &str = "kubeadm";

// Labels
pub const LABEL_REGION: &str = "topology.kubeclipper.io/region";
pub const LABEL_BACKUP_POINT: &str = "kubeclipper.io/backupPoint";
pub const LABEL_EXTERNAL_IP: &str = "kubeclipper.io/externalIP";
pub const LABEL_EXTERNAL_PORT: &str = "kubeclipper.io/externalPort";
pub const LABEL_EXTERNAL_DOMAIN: &str = "kubeclipper.io/externalDomain";
pub const LABEL_EXTERNAL_DOMAIN_PORT: &str = "kubeclipper.io/externalDomainPort";

// Annotations
pub const ANNOTATION_DESCRIPTION: &str = "kubeclipper.io/description";
pub const ANNOTATION_OFFLINE: &str = "kubeclipper.io/offline";

// Taints
pub const CONTROL_PLANE_TAINT_KEY: &str = "node-role.kubernetes.io/control-plane";
pub const CONTROL_PLANE_TAINT_MIN_VERSION: &str = "v1.24.0";

// Networking
pub const IP_FAMILY_IPV4: &str = "IPv4";
pub const DEFAULT_CNI: &str = "calico";
pub const AUTO_DETECTION_FIRST_FOUND: &str = "first-found";

// Add-ons
pub const ADDON_ENABLE_KEY: &str = "enable";
pub const ADDON_DEFAULT_SC_KEY: &str = "isDefaultSC";
pub const ADDON_FILTERED_LIST_KEYS: [&str; 2] = ["mountOptions", "monitors"];
pub const ADDON_PASSWORD_FORMAT: &str = "password";

// Backups
pub const CLUSTER_STATUS_RUNNING: &str = "Running";
