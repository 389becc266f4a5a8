use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::{constants, model::Error};

/// Catalog record of an installable add-on component
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMeta {
    pub name: String,
    pub version: String,
    /// Only one instance of the component may be installed in a cluster
    #[serde(default)]
    pub unique: bool,
    /// JSON schema of the component configuration
    #[serde(default)]
    pub schema: Option<Value>,
}

/// Ordered list of the components available for installation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct ComponentCatalog {
    pub components: Vec<ComponentMeta>,
}

impl ComponentCatalog {
    pub fn new(components: Vec<ComponentMeta>) -> Self {
        ComponentCatalog { components }
    }

    pub fn find(&self, name: &str) -> Option<&ComponentMeta> {
        self.components.iter().find(|component| component.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentMeta> {
        self.components.iter()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageTab {
    /// Storage class family, matches a catalog component name
    pub name: String,
    #[serde(default)]
    pub form_data: Vec<Map<String, Value>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PluginForm {
    #[serde(default)]
    pub form_data: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PluginsInput {
    #[serde(default)]
    pub forms: BTreeMap<String, PluginForm>,
}

/// Storage and plugin sub-forms of the cluster form
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddonInput {
    #[serde(default)]
    pub storage_tabs: Vec<StorageTab>,
    #[serde(default)]
    pub default_storage: Option<String>,
    #[serde(default)]
    pub plugins: PluginsInput,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AddonComponent {
    pub name: String,
    pub version: String,
    pub config: Map<String, Value>,
}

/// Cross-component validation and serialization of the enabled add-ons
pub trait PropertyEncoder {
    fn encode(&self, catalog: &ComponentCatalog, components: Vec<AddonComponent>) -> Result<Vec<AddonComponent>, Error>;
}

/// Encodes password properties declared in the catalog schema and checks cross-component constraints
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaPropertyEncoder;

impl SchemaPropertyEncoder {
    fn password_properties(meta: &ComponentMeta) -> Vec<String> {
        meta.schema
            .as_ref()
            .and_then(|schema| schema.get("properties"))
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .filter(|(_, property)| property.get("format").and_then(Value::as_str) == Some(constants::ADDON_PASSWORD_FORMAT))
                    .map(|(key, _)| key.to_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl PropertyEncoder for SchemaPropertyEncoder {
    fn encode(&self, catalog: &ComponentCatalog, components: Vec<AddonComponent>) -> Result<Vec<AddonComponent>, Error> {
        let default_classes = components
            .iter()
            .filter(|component| component.config.get(constants::ADDON_DEFAULT_SC_KEY) == Some(&Value::Bool(true)))
            .count();
        if default_classes > 1 {
            return Err(Error::PropertyEncodingError(format!(
                "{default_classes} storage classes are marked as default"
            )));
        }

        let mut encoded = Vec::with_capacity(components.len());
        for mut component in components {
            let meta = catalog
                .find(&component.name)
                .ok_or_else(|| Error::UnresolvableComponent(component.name.to_owned()))?;
            if meta.unique && encoded.iter().any(|other: &AddonComponent| other.name == component.name) {
                return Err(Error::PropertyEncodingError(format!(
                    "component {} can only be installed once",
                    component.name
                )));
            }
            for key in Self::password_properties(meta) {
                if let Some(Value::String(secret)) = component.config.get(&key) {
                    let secret = STANDARD.encode(secret);
                    component.config.insert(key, Value::String(secret));
                }
            }
            encoded.push(component);
        }
        Ok(encoded)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_enabled(form_data: &Map<String, Value>) -> bool {
    form_data.get(constants::ADDON_ENABLE_KEY).map_or(false, is_truthy)
}

/// Storage entry without its `enable` flag, list settings cleaned and the default class flag set
fn storage_config(item: &Map<String, Value>, default_storage: Option<&str>) -> Map<String, Value> {
    let mut config = item.clone();
    config.remove(constants::ADDON_ENABLE_KEY);
    let sc_name = item.get("scName").and_then(Value::as_str);
    let is_default = sc_name.is_some() && sc_name == Some(default_storage.unwrap_or_default());
    config.insert(constants::ADDON_DEFAULT_SC_KEY.to_owned(), Value::Bool(is_default));
    for key in constants::ADDON_FILTERED_LIST_KEYS {
        if let Some(Value::Array(values)) = item.get(key) {
            if !values.is_empty() {
                let filtered: Vec<Value> = values.iter().filter(|value| is_truthy(value)).cloned().collect();
                config.insert(key.to_owned(), Value::Array(filtered));
            }
        }
    }
    config
}

/// Enabled storage entries in tab order, then enabled plugins in catalog order. Versions are not resolved yet.
pub fn collect_enabled_components(input: &AddonInput, catalog: &ComponentCatalog) -> Vec<(String, Map<String, Value>)> {
    let mut enabled: Vec<(String, Map<String, Value>)> = Vec::new();
    for tab in &input.storage_tabs {
        for item in tab.form_data.iter().filter(|item| is_enabled(item)) {
            debug!("Storage class {} enabled", tab.name);
            enabled.push((tab.name.to_owned(), storage_config(item, input.default_storage.as_deref())));
        }
    }

    let mut plugin_names: Vec<&String> = catalog
        .iter()
        .filter_map(|meta| input.plugins.forms.get_key_value(&meta.name).map(|(name, _)| name))
        .collect();
    // Forms without a catalog entry keep their place after the known ones so the lookup can reject them
    plugin_names.extend(input.plugins.forms.keys().filter(|name| catalog.find(name).is_none()));
    for name in plugin_names {
        let form = &input.plugins.forms[name];
        if is_enabled(&form.form_data) {
            debug!("Plugin {name} enabled");
            let mut config = form.form_data.clone();
            config.remove(constants::ADDON_ENABLE_KEY);
            enabled.push((name.to_owned(), config));
        }
    }
    enabled
}

/// Builds the `addons` section of the manifest.
///
/// Fails when an enabled component has no catalog entry, or when the encoder rejects the set.
pub fn encode_addons(input: &AddonInput, catalog: &ComponentCatalog, encoder: &dyn PropertyEncoder) -> Result<Vec<AddonComponent>, Error> {
    let components = collect_enabled_components(input, catalog)
        .into_iter()
        .map(|(name, config)| {
            let version = catalog
                .find(&name)
                .map(|meta| meta.version.to_owned())
                .ok_or_else(|| Error::UnresolvableComponent(name.to_owned()))?;
            Ok(AddonComponent { name, version, config })
        })
        .collect::<Result<Vec<AddonComponent>, Error>>()?;
    info!("Encoding {} add-on components", components.len());
    encoder.encode(catalog, components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> ComponentCatalog {
        serde_yaml::from_str(
            r#"
- name: nfs-provisioner
  version: v1
- name: cinder
  version: v2
  schema:
    properties:
      password:
        type: string
        format: password
      authURL:
        type: string
- name: kubesphere
  version: v3.3.1
  unique: true
- name: harbor
  version: v2.6.0
"#,
        )
        .unwrap()
    }

    fn addon_input() -> AddonInput {
        serde_yaml::from_str(
            r#"
defaultStorage: nfs-sc
storageTabs:
  - name: nfs-provisioner
    formData:
      - enable: true
        scName: nfs-sc
        serverAddr: 10.0.0.10
        mountOptions: [nfsvers=4.1, "", null]
      - enable: false
        scName: nfs-disabled
      - enable: true
        scName: nfs-archive
  - name: cinder
    formData:
      - enable: true
        scName: cinder-sc
        password: s3cret
        authURL: http://keystone:5000/v3
        monitors: []
plugins:
  forms:
    kubesphere:
      formData:
        enable: true
        console: 30880
    harbor:
      formData:
        enable: true
        domain: harbor.local
"#,
        )
        .unwrap()
    }

    #[test]
    fn storage_entries_come_before_plugins() {
        let addons = encode_addons(&addon_input(), &catalog(), &SchemaPropertyEncoder).unwrap();
        let names: Vec<&str> = addons.iter().map(|addon| addon.name.as_str()).collect();
        assert_eq!(names, vec!["nfs-provisioner", "nfs-provisioner", "cinder", "kubesphere", "harbor"]);
        assert_eq!(addons[3].version, "v3.3.1");
        assert_eq!(addons[3].config, json!({"console": 30880}).as_object().unwrap().clone());
    }

    #[test]
    fn default_storage_class_is_flagged() {
        let addons = encode_addons(&addon_input(), &catalog(), &SchemaPropertyEncoder).unwrap();
        assert_eq!(addons[0].config["isDefaultSC"], json!(true));
        assert_eq!(addons[1].config["isDefaultSC"], json!(false));
        assert_eq!(addons[2].config["isDefaultSC"], json!(false));
        assert!(!addons[0].config.contains_key("enable"));
    }

    #[test]
    fn list_settings_drop_empty_entries() {
        let addons = encode_addons(&addon_input(), &catalog(), &SchemaPropertyEncoder).unwrap();
        assert_eq!(addons[0].config["mountOptions"], json!(["nfsvers=4.1"]));
        assert_eq!(addons[2].config["monitors"], json!([]));
    }

    #[test]
    fn password_properties_are_encoded() {
        let addons = encode_addons(&addon_input(), &catalog(), &SchemaPropertyEncoder).unwrap();
        assert_eq!(addons[2].config["password"], json!("czNjcmV0"));
        assert_eq!(addons[2].config["authURL"], json!("http://keystone:5000/v3"));
    }

    #[test]
    fn unknown_component_fails() {
        let mut input = addon_input();
        input.plugins.forms.insert(
            "istio".to_owned(),
            PluginForm { form_data: json!({"enable": true}).as_object().unwrap().clone() },
        );
        match encode_addons(&input, &catalog(), &SchemaPropertyEncoder) {
            Err(Error::UnresolvableComponent(name)) => assert_eq!(name, "istio"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn disabled_unknown_component_is_ignored() {
        let mut input = addon_input();
        input.plugins.forms.insert(
            "istio".to_owned(),
            PluginForm { form_data: json!({"enable": false}).as_object().unwrap().clone() },
        );
        assert_eq!(encode_addons(&input, &catalog(), &SchemaPropertyEncoder).unwrap().len(), 5);
    }

    #[test]
    fn rejects_two_default_storage_classes() {
        let mut input = addon_input();
        input.storage_tabs[1].form_data[0].insert("scName".to_owned(), json!("nfs-sc"));
        assert!(matches!(
            encode_addons(&input, &catalog(), &SchemaPropertyEncoder),
            Err(Error::PropertyEncodingError(_))
        ));
    }

    #[test]
    fn rejects_duplicated_unique_component() {
        let components = vec![
            AddonComponent { name: "kubesphere".to_owned(), version: "v3.3.1".to_owned(), config: Map::new() },
            AddonComponent { name: "kubesphere".to_owned(), version: "v3.3.1".to_owned(), config: Map::new() },
        ];
        assert!(matches!(
            SchemaPropertyEncoder.encode(&catalog(), components),
            Err(Error::PropertyEncodingError(_))
        ));
    }
}
