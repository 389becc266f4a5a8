use chrono::{DateTime, FixedOffset, NaiveTime, SecondsFormat, Timelike};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cron::{CronField, CronFields};
use crate::{constants, model::Error, utils};

/// Raw value of the second level of the cycle picker
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum CycleValue {
    Number(u32),
    Text(String),
}

/// Coarse period picked at the first level: the template and the field the second level refines
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PeriodTemplate {
    pub key: CronField,
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Refinement {
    #[serde(default)]
    pub value: Option<CycleValue>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub first_level_selected: PeriodTemplate,
    #[serde(default)]
    pub second_level_selected: Option<Refinement>,
}

impl Cycle {
    /// Value chosen at the second level. Empty values and zero count as not chosen.
    pub fn refinement(&self) -> Result<Option<u32>, Error> {
        match self.second_level_selected.as_ref().and_then(|refinement| refinement.value.as_ref()) {
            None | Some(CycleValue::Number(0)) => Ok(None),
            Some(CycleValue::Number(value)) => Ok(Some(*value)),
            Some(CycleValue::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(CycleValue::Text(text)) => text
                .trim()
                .parse::<u32>()
                .map(Some)
                .map_err(|_| Error::InvalidCycle(format!("'{text}' is not a valid {} value", self.first_level_selected.key))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum SchedulePlanInput {
    OnlyOnce {
        date: DateTime<FixedOffset>,
    },
    #[serde(rename_all = "camelCase")]
    Repeat {
        cycle: Cycle,
        #[serde(deserialize_with = "utils::deserialize_time_of_day")]
        time: NaiveTime,
        max_backup_num: u32,
    },
}

/// Snapshot of the scheduled backup form
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScheduleFormValues {
    pub name: String,
    #[serde(flatten)]
    pub plan: SchedulePlanInput,
}

/// Cluster a backup is scheduled for
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupTarget {
    pub name: String,
    #[serde(default)]
    pub backup_point: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl BackupTarget {
    /// Backups need a backup point and a running cluster
    pub fn ensure_backup_allowed(&self) -> Result<(), Error> {
        if self.backup_point.as_deref().map_or(true, str::is_empty) {
            return Err(Error::BackupNotAllowed(format!(
                "cluster {} has no backup point, add one in the cluster settings",
                self.name
            )));
        }
        if self.status.as_deref() != Some(constants::CLUSTER_STATUS_RUNNING) {
            return Err(Error::BackupNotAllowed(format!(
                "cluster {} is not running",
                self.name
            )));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum BackupPlan {
    #[serde(rename_all = "camelCase")]
    OnlyOnce { run_at: String },
    #[serde(rename_all = "camelCase")]
    Repeat { schedule: String, max_backup_num: u32 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupScheduleSpec {
    pub cluster_name: String,
    #[serde(flatten)]
    pub plan: BackupPlan,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupSchedule {
    pub kind: String,
    pub api_version: String,
    pub metadata: ObjectMeta,
    pub spec: BackupScheduleSpec,
}

/// Turns the cycle template and time of day into a five field cron expression.
///
/// The template keeps every field but the refined one and the time of day.
pub fn build_cron_expression(cycle: &Cycle, time: &NaiveTime) -> Result<String, Error> {
    let mut fields = CronFields::parse(&cycle.first_level_selected.value)?;
    if let Some(value) = cycle.refinement()? {
        debug!("Refining {} with {value}", cycle.first_level_selected.key);
        fields.set(cycle.first_level_selected.key, value)?;
    }
    fields.set(CronField::Hour, time.hour())?;
    fields.set(CronField::Minute, time.minute())?;
    fields.set(CronField::Second, time.second())?;
    Ok(fields.stringify(false))
}

pub fn build_backup_schedule(values: &ScheduleFormValues, cluster_name: &str) -> Result<BackupSchedule, Error> {
    let plan = match &values.plan {
        SchedulePlanInput::OnlyOnce { date } => BackupPlan::OnlyOnce {
            run_at: date.to_rfc3339_opts(SecondsFormat::Secs, false),
        },
        SchedulePlanInput::Repeat {
            cycle,
            time,
            max_backup_num,
        } => BackupPlan::Repeat {
            schedule: build_cron_expression(cycle, time)?,
            max_backup_num: *max_backup_num,
        },
    };
    info!("Backup schedule {} built for cluster {cluster_name}", values.name);
    Ok(BackupSchedule {
        kind: constants::CRON_BACKUP_KIND.to_owned(),
        api_version: constants::API_VERSION.to_owned(),
        metadata: ObjectMeta {
            name: Some(values.name.to_owned()),
            ..ObjectMeta::default()
        },
        spec: BackupScheduleSpec {
            cluster_name: cluster_name.to_owned(),
            plan,
        },
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn repeat_form(template: &str, key: &str, refinement: &str) -> ScheduleFormValues {
        serde_yaml::from_str(&format!(
            r#"
name: nightly
type: Repeat
cycle:
  firstLevelSelected:
    key: {key}
    value: "{template}"
  secondLevelSelected:
    value: "{refinement}"
time: "03:15:00"
maxBackupNum: 7
"#
        ))
        .unwrap()
    }

    #[test]
    fn one_shot_sets_only_run_at() {
        let values: ScheduleFormValues = serde_yaml::from_str(
            r#"
name: before-upgrade
type: OnlyOnce
date: 2023-04-01T22:30:00+08:00
"#,
        )
        .unwrap();
        let schedule = build_backup_schedule(&values, "demo").unwrap();
        let value = serde_json::to_value(&schedule).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "CronBackup",
                "apiVersion": "core.kubeclipper.io/v1",
                "metadata": {"name": "before-upgrade"},
                "spec": {"clusterName": "demo", "runAt": "2023-04-01T22:30:00+08:00"},
            })
        );
    }

    #[test]
    fn repeat_without_refinement_keeps_template() {
        let schedule = build_backup_schedule(&repeat_form("0 0 * * 1-5", "dayOfWeek", ""), "demo").unwrap();
        let value = serde_json::to_value(&schedule).unwrap();
        assert_eq!(value["spec"], json!({"clusterName": "demo", "schedule": "15 3 * * 1-5", "maxBackupNum": 7}));
        assert!(value["spec"].get("runAt").is_none());

        let BackupPlan::Repeat { schedule, .. } = schedule.spec.plan else {
            panic!("expected a repeating plan");
        };
        let fields = CronFields::parse(&schedule).unwrap();
        assert_eq!(fields.get(CronField::Hour), &[3]);
        assert_eq!(fields.get(CronField::Minute), &[15]);
        assert_eq!(fields.get(CronField::Second), &[0]);
        assert_eq!(fields.get(CronField::DayOfWeek), CronFields::parse("0 0 * * 1-5").unwrap().get(CronField::DayOfWeek));
    }

    #[test]
    fn refinement_overwrites_the_selected_field() {
        let weekly = build_cron_expression(
            match &repeat_form("0 0 * * 0", "dayOfWeek", "3").plan {
                SchedulePlanInput::Repeat { cycle, .. } => cycle,
                _ => unreachable!(),
            },
            &NaiveTime::from_hms_opt(23, 45, 0).unwrap(),
        )
        .unwrap();
        assert_eq!(weekly, "45 23 * * 3");

        let schedule = build_backup_schedule(&repeat_form("0 0 1 * *", "dayOfMonth", "15"), "demo").unwrap();
        assert_eq!(
            schedule.spec.plan,
            BackupPlan::Repeat { schedule: "15 3 15 * *".to_owned(), max_backup_num: 7 }
        );
    }

    #[test]
    fn malformed_template_fails() {
        assert!(matches!(
            build_backup_schedule(&repeat_form("every day", "dayOfWeek", ""), "demo"),
            Err(Error::CronParseError { .. })
        ));
    }

    #[test]
    fn invalid_refinement_fails() {
        assert!(matches!(
            build_backup_schedule(&repeat_form("0 0 1 * *", "dayOfMonth", "32"), "demo"),
            Err(Error::InvalidCycle(_))
        ));
        assert!(matches!(
            build_backup_schedule(&repeat_form("0 0 1 * *", "dayOfMonth", "first"), "demo"),
            Err(Error::InvalidCycle(_))
        ));
    }

    #[test]
    fn unknown_refinement_key_is_rejected() {
        let result: Result<ScheduleFormValues, _> = serde_yaml::from_str(
            r#"
name: nightly
type: Repeat
cycle:
  firstLevelSelected:
    key: fortnight
    value: "0 0 * * *"
time: "03:15"
maxBackupNum: 7
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn backup_requires_point_and_running_cluster() {
        let mut target = BackupTarget {
            name: "demo".to_owned(),
            backup_point: Some("nfs-point".to_owned()),
            status: Some("Running".to_owned()),
        };
        assert!(target.ensure_backup_allowed().is_ok());
        target.status = Some("Installing".to_owned());
        assert!(matches!(target.ensure_backup_allowed(), Err(Error::BackupNotAllowed(_))));
        target.status = Some("Running".to_owned());
        target.backup_point = None;
        assert!(matches!(target.ensure_backup_allowed(), Err(Error::BackupNotAllowed(_))));
    }
}
