//! CloudFormation template builder.
//!
//! Resources and outputs are kept in ordered maps and properties are plain
//! JSON objects, so serialization always produces the same key order.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{StackError, StackResult};

pub const FORMAT_VERSION: &str = "2010-09-09";

/// `{"Ref": name}`
pub fn reference(name: &str) -> Value {
    json!({ "Ref": name })
}

/// `{"Fn::GetAtt": [name, attribute]}`
pub fn get_att(name: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [name, attribute] })
}

/// A single template resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    pub properties: Map<String, Value>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties: Map::new(),
        }
    }

    pub fn property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: Value,
}

/// A CloudFormation template under construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resources: BTreeMap<String, Resource>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Default for Template {
    fn default() -> Self {
        Self::new()
    }
}

impl Template {
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            description: None,
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a resource. Logical names must be unique.
    pub fn add_resource(&mut self, name: impl Into<String>, resource: Resource) -> StackResult<()> {
        let name = name.into();
        if self.resources.contains_key(&name) {
            return Err(StackError::render(format!("duplicate resource '{}'", name)));
        }
        debug!("Declaring resource {} ({})", name, resource.resource_type);
        self.resources.insert(name, resource);
        Ok(())
    }

    pub fn add_output(&mut self, name: impl Into<String>, description: Option<String>, value: Value) {
        self.outputs.insert(name.into(), Output { description, value });
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    /// Logical names of every resource of the given type.
    pub fn resources_of_type(&self, resource_type: &str) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, r)| r.resource_type == resource_type)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> StackResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StackError::render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_serialization_shape() {
        let mut template = Template::new().with_description("test");
        template
            .add_resource(
                "VPC",
                Resource::new("AWS::EC2::VPC").property("CidrBlock", json!("10.0.0.0/16")),
            )
            .unwrap();
        template.add_output("VpcId", None, reference("VPC"));

        let value: Value = serde_json::from_str(&template.to_json().unwrap()).unwrap();
        assert_eq!(value["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(value["Description"], "test");
        assert_eq!(value["Resources"]["VPC"]["Type"], "AWS::EC2::VPC");
        assert_eq!(value["Resources"]["VPC"]["Properties"]["CidrBlock"], "10.0.0.0/16");
        assert_eq!(value["Outputs"]["VpcId"]["Value"]["Ref"], "VPC");
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let mut template = Template::new();
        template.add_resource("A", Resource::new("AWS::EC2::VPC")).unwrap();
        let err = template.add_resource("A", Resource::new("AWS::EC2::VPC")).unwrap_err();
        assert!(matches!(err, StackError::Render(_)));
    }

    #[test]
    fn test_output_is_stable_regardless_of_insertion_order() {
        let mut first = Template::new();
        first.add_resource("B", Resource::new("T").property("z", json!(1)).property("a", json!(2))).unwrap();
        first.add_resource("A", Resource::new("T")).unwrap();

        let mut second = Template::new();
        second.add_resource("A", Resource::new("T")).unwrap();
        second.add_resource("B", Resource::new("T").property("a", json!(2)).property("z", json!(1))).unwrap();

        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        assert_eq!(first.resources_of_type("T"), vec!["A", "B"]);
    }

    #[test]
    fn test_intrinsics() {
        assert_eq!(get_att("LB", "DNSName"), json!({"Fn::GetAtt": ["LB", "DNSName"]}));
    }
}
