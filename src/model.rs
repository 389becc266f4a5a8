/// All errors possible to occur while synthesizing or submitting documents
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any error originating from the `kube-rs` crate
    #[error("Kubernetes reported error: {source}")]
    KubeError {
        #[from]
        source: kube::Error,
    },

    /// An enabled add-on has no entry in the component catalog
    #[error("Add-on component {0} is not present in the catalog")]
    UnresolvableComponent(String),

    /// The property encoder rejected the set of enabled add-ons
    #[error("Invalid add-on configuration: {0}")]
    PropertyEncodingError(String),

    /// The selected IP family needs a value the form does not carry
    #[error("Incomplete networking: {0}")]
    IncompleteNetwork(String),

    /// The cycle template could not be parsed as a cron expression
    #[error("Invalid cron expression '{expression}': {reason}")]
    CronParseError { expression: String, reason: String },

    /// The cycle selection cannot be applied to the schedule
    #[error("Invalid backup cycle: {0}")]
    InvalidCycle(String),

    /// The cluster is not in a state that allows scheduling backups
    #[error("Backup not allowed: {0}")]
    BackupNotAllowed(String),

    /// The synthesizer configuration is invalid
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("YAML Parsing error: {0}")]
    ParserError(
        #[from]
        serde_yaml::Error,
    ),

    #[error("JSON conversion error: {0}")]
    JsonError(
        #[from]
        serde_json::Error,
    ),

    #[error("IO error: {0}")]
    IoError(
        #[from]
        std::io::Error,
    ),
}
