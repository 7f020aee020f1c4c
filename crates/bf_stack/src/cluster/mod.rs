//! The `Cluster` stack kind: an autoscaling group with an optional load
//! balancer, subnets and IAM instance profile.

mod render;

use std::any::Any;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use bf_lookup::ResourceLookup;
use bf_rules::{ConstraintTable, FieldConstraint, FieldType, RuleSet};

use crate::context::RenderContext;
use crate::error::{StackError, StackResult};
use crate::stack::{decode_onto, Stack};

/// Context key holding the autoscaling group's resolved subnet ids.
pub const ASG_SUBNETS_KEY: &str = "autoscalingGroup.subnetIds";
/// Context key holding the load balancer's resolved subnet ids.
pub const LB_SUBNETS_KEY: &str = "loadBalancer.subnetIds";

pub const DEFAULT_TAG_NAME: &str = "Name";

const IAM_PROFILE_KEY: &str = "iamInstanceProfile";
/// Older configurations spell the IAM profile key with a lowercase `p`.
const LEGACY_IAM_PROFILE_KEY: &str = "iamInstanceprofile";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cluster {
    pub name: String,
    pub region: String,
    pub vpc_id: String,
    pub autoscaling_group: AutoscalingGroup,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoscalingGroup {
    pub image: String,
    pub instance_type: String,
    pub subnets: Subnets,
    #[serde(alias = "iamInstanceprofile", skip_serializing_if = "Option::is_none")]
    pub iam_instance_profile: Option<IamInstanceProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IamInstanceProfile {
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
}

/// A single IAM policy statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Policy {
    pub effect: String,
    pub action: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadBalancer {
    pub scheme: String,
    pub public: bool,
    pub health_check: HealthCheck,
    pub subnets: Subnets,
}

/// Subnet selection: explicit ids, or a tag key resolved at render time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Subnets {
    pub tag: String,
    pub tag_name: String,
    pub ids: Vec<String>,
}

impl Subnets {
    pub fn by_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn by_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            tag_name: DEFAULT_TAG_NAME.to_string(),
            ids: Vec::new(),
        }
    }

    fn check_selection(&self, path: &str) -> StackResult<()> {
        match (self.tag.is_empty(), self.ids.is_empty()) {
            (false, true) | (true, false) => Ok(()),
            (true, true) => Err(StackError::validation(
                path,
                "subnet-selection",
                "subnet tag or ids required",
            )),
            (false, false) => Err(StackError::validation(
                path,
                "subnet-selection",
                "subnet tag and ids are mutually exclusive",
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthCheck {
    pub target: String,
    pub healthy_threshold: String,
    pub unhealthy_threshold: String,
    pub interval: String,
    pub timeout: String,
}

/// Rewrite legacy key spellings to their current names so the schema and
/// field rules see them.
fn normalize_legacy_keys(doc: &Value) -> StackResult<Value> {
    let mut doc = doc.clone();
    if let Some(group) = doc.get_mut("autoscalingGroup").and_then(Value::as_object_mut) {
        if let Some(profile) = group.remove(LEGACY_IAM_PROFILE_KEY) {
            if group.contains_key(IAM_PROFILE_KEY) {
                return Err(StackError::MalformedConfig(format!(
                    "autoscalingGroup sets both {} and {}",
                    IAM_PROFILE_KEY, LEGACY_IAM_PROFILE_KEY
                )));
            }
            debug!("Reading legacy key autoscalingGroup.{}", LEGACY_IAM_PROFILE_KEY);
            group.insert(IAM_PROFILE_KEY.to_string(), profile);
        }
    }
    Ok(doc)
}

fn subnet_constraints(table: ConstraintTable, prefix: &str) -> ConstraintTable {
    table
        .field(FieldConstraint::required(prefix, FieldType::Object))
        .field(FieldConstraint::optional(format!("{}.tag", prefix), FieldType::String).rule("ascii"))
        .field(FieldConstraint::optional(format!("{}.tagName", prefix), FieldType::String).rule("ascii"))
        .field(FieldConstraint::optional(format!("{}.ids", prefix), FieldType::StringList).rule("subnet"))
}

impl Cluster {
    pub const KIND: &'static str = "Cluster";

    /// Zero-value cluster. The autoscaling group selects subnets by the
    /// `Name` tag unless the configuration says otherwise.
    pub fn new() -> Self {
        Self {
            autoscaling_group: AutoscalingGroup {
                subnets: Subnets {
                    tag_name: DEFAULT_TAG_NAME.to_string(),
                    ..Subnets::default()
                },
                ..AutoscalingGroup::default()
            },
            ..Self::default()
        }
    }

    /// Per-field constraints, checked in order.
    pub fn constraints() -> ConstraintTable {
        let table = ConstraintTable::new()
            .field(FieldConstraint::required("name", FieldType::String).rule("alphanum"))
            .field(FieldConstraint::required("region", FieldType::String).rule("region"))
            .field(FieldConstraint::required("vpcId", FieldType::String).rule("vpc"))
            .field(FieldConstraint::required("autoscalingGroup", FieldType::Object))
            .field(FieldConstraint::required("autoscalingGroup.image", FieldType::String))
            .field(FieldConstraint::required("autoscalingGroup.instanceType", FieldType::String));

        let table = subnet_constraints(table, "autoscalingGroup.subnets")
            .field(FieldConstraint::optional("autoscalingGroup.iamInstanceProfile", FieldType::Object))
            .field(FieldConstraint::optional(
                "autoscalingGroup.iamInstanceProfile.roles",
                FieldType::StringList,
            ))
            .field(FieldConstraint::optional(
                "autoscalingGroup.iamInstanceProfile.policy",
                FieldType::Object,
            ))
            .field(
                FieldConstraint::required(
                    "autoscalingGroup.iamInstanceProfile.policy.effect",
                    FieldType::String,
                )
                .rule("effect"),
            )
            .field(
                FieldConstraint::required(
                    "autoscalingGroup.iamInstanceProfile.policy.action",
                    FieldType::StringList,
                )
                .rule("action"),
            )
            .field(FieldConstraint::optional("loadBalancer", FieldType::Object))
            .field(FieldConstraint::required("loadBalancer.scheme", FieldType::String).rule("scheme"))
            .field(FieldConstraint::optional("loadBalancer.public", FieldType::Bool))
            .field(FieldConstraint::required("loadBalancer.healthCheck", FieldType::Object))
            .field(
                FieldConstraint::required("loadBalancer.healthCheck.target", FieldType::String)
                    .rule("alphanum"),
            );

        let table = [
            "healthyThreshold",
            "unhealthyThreshold",
            "interval",
            "timeout",
        ]
        .iter()
        .fold(table, |table, field| {
            table.field(
                FieldConstraint::required(
                    format!("loadBalancer.healthCheck.{}", field),
                    FieldType::String,
                )
                .rule("numeric"),
            )
        });

        subnet_constraints(table, "loadBalancer.subnets")
    }

    /// Check field rules against a custom rule set, then cross-field rules.
    pub fn validate_with(&self, rules: &RuleSet) -> StackResult<()> {
        let doc = serde_json::to_value(self)
            .map_err(|e| StackError::MalformedConfig(e.to_string()))?;
        Self::constraints().validate(&doc, rules)?;

        if let Some(lb) = &self.load_balancer {
            lb.subnets.check_selection("loadBalancer.subnets")?;
        }
        self.autoscaling_group
            .subnets
            .check_selection("autoscalingGroup.subnets")?;

        debug!("Cluster {} passed validation", self.name);
        Ok(())
    }

    async fn resolve_subnets(
        &self,
        subnets: &Subnets,
        lookup: &dyn ResourceLookup,
    ) -> StackResult<Vec<String>> {
        if !subnets.ids.is_empty() {
            debug!("Using {} explicit subnet id(s)", subnets.ids.len());
            return Ok(subnets.ids.clone());
        }

        let ids = lookup
            .find_ids_by_tag(&subnets.tag, &self.vpc_id)
            .await
            .map_err(|e| {
                warn!("Subnet lookup for tag '{}' failed: {}", subnets.tag, e);
                StackError::lookup(&subnets.tag, &self.vpc_id, e)
            })?;

        if ids.is_empty() {
            return Err(StackError::no_matches(&subnets.tag, &self.vpc_id));
        }
        Ok(ids)
    }
}

#[async_trait]
impl Stack for Cluster {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn region(&self) -> Option<&str> {
        Some(self.region.as_str()).filter(|r| !r.is_empty())
    }

    fn decode(&mut self, doc: &Value) -> StackResult<()> {
        let doc = normalize_legacy_keys(doc)?;
        Self::constraints().schema_check(&doc)?;
        decode_onto(self, &doc)
    }

    fn validate(&self) -> StackResult<()> {
        self.validate_with(&RuleSet::standard())
    }

    async fn before_render(
        &self,
        ctx: RenderContext,
        lookup: &dyn ResourceLookup,
    ) -> StackResult<RenderContext> {
        let asg_subnets = self
            .resolve_subnets(&self.autoscaling_group.subnets, lookup)
            .await?;
        let mut ctx = ctx.with_value(ASG_SUBNETS_KEY, asg_subnets)?;

        if let Some(lb) = &self.load_balancer {
            let lb_subnets = self.resolve_subnets(&lb.subnets, lookup).await?;
            ctx = ctx.with_value(LB_SUBNETS_KEY, lb_subnets)?;
        }

        info!("Prepared render context for cluster {}", self.name);
        Ok(ctx)
    }

    fn render(&self, ctx: &RenderContext) -> StackResult<String> {
        let template = self.build_template(ctx)?;
        info!(
            "Rendered cluster {} with {} resource(s)",
            self.name,
            template.resources.len()
        );
        template.to_json()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn valid_cluster() -> Cluster {
        let mut cluster = Cluster::new();
        cluster.name = "web1".to_string();
        cluster.region = "us-west-2".to_string();
        cluster.vpc_id = "vpc-0abc1234".to_string();
        cluster.autoscaling_group.image = "ami-1".to_string();
        cluster.autoscaling_group.instance_type = "t3.micro".to_string();
        cluster.autoscaling_group.subnets.ids = vec!["subnet-aaa".to_string()];
        cluster
    }

    fn load_balancer(subnets: Subnets) -> LoadBalancer {
        LoadBalancer {
            scheme: "internet-facing".to_string(),
            public: true,
            health_check: HealthCheck {
                target: "health".to_string(),
                healthy_threshold: "3".to_string(),
                unhealthy_threshold: "5".to_string(),
                interval: "30".to_string(),
                timeout: "5".to_string(),
            },
            subnets,
        }
    }

    fn violation(err: StackError) -> (String, String) {
        match err {
            StackError::Validation { path, rule, .. } => (path, rule),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_new_defaults_tag_name() {
        let cluster = Cluster::new();
        assert_eq!(cluster.autoscaling_group.subnets.tag_name, "Name");
        assert!(cluster.load_balancer.is_none());
        assert_eq!(cluster.kind(), "Cluster");
    }

    #[test]
    fn test_valid_cluster_without_load_balancer() {
        assert!(valid_cluster().validate().is_ok());
    }

    #[test]
    fn test_valid_cluster_with_load_balancer() {
        let mut cluster = valid_cluster();
        cluster.load_balancer = Some(load_balancer(Subnets::by_tag("public")));
        assert!(cluster.validate().is_ok());
    }

    #[test]
    fn test_field_rules() {
        let mut cluster = valid_cluster();
        cluster.region = "us-east-99".to_string();
        assert_eq!(
            violation(cluster.validate().unwrap_err()),
            ("region".to_string(), "region".to_string())
        );

        let mut cluster = valid_cluster();
        cluster.vpc_id = "subnet-1a2b".to_string();
        assert_eq!(violation(cluster.validate().unwrap_err()).0, "vpcId");

        let mut cluster = valid_cluster();
        cluster.name = "web-1".to_string();
        assert_eq!(
            violation(cluster.validate().unwrap_err()),
            ("name".to_string(), "alphanum".to_string())
        );

        let mut cluster = valid_cluster();
        cluster.autoscaling_group.image.clear();
        assert_eq!(
            violation(cluster.validate().unwrap_err()),
            ("autoscalingGroup.image".to_string(), "required".to_string())
        );
    }

    #[test]
    fn test_load_balancer_rules() {
        let mut cluster = valid_cluster();
        let mut lb = load_balancer(Subnets::by_tag("public"));
        lb.scheme = "public".to_string();
        cluster.load_balancer = Some(lb);
        assert_eq!(
            violation(cluster.validate().unwrap_err()),
            ("loadBalancer.scheme".to_string(), "scheme".to_string())
        );

        let mut cluster = valid_cluster();
        let mut lb = load_balancer(Subnets::by_tag("public"));
        lb.health_check.interval = "thirty".to_string();
        cluster.load_balancer = Some(lb);
        assert_eq!(
            violation(cluster.validate().unwrap_err()),
            (
                "loadBalancer.healthCheck.interval".to_string(),
                "numeric".to_string()
            )
        );
    }

    #[test]
    fn test_load_balancer_subnet_selection_required() {
        let mut cluster = valid_cluster();
        cluster.load_balancer = Some(load_balancer(Subnets::default()));
        assert_eq!(
            violation(cluster.validate().unwrap_err()),
            (
                "loadBalancer.subnets".to_string(),
                "subnet-selection".to_string()
            )
        );
    }

    #[test]
    fn test_subnet_selection_is_exclusive() {
        let mut cluster = valid_cluster();
        cluster.autoscaling_group.subnets.tag = "private".to_string();
        assert_eq!(
            violation(cluster.validate().unwrap_err()),
            (
                "autoscalingGroup.subnets".to_string(),
                "subnet-selection".to_string()
            )
        );
    }

    #[test]
    fn test_explicit_subnet_ids_must_look_like_subnets() {
        let mut cluster = valid_cluster();
        cluster.autoscaling_group.subnets.ids = vec!["subnet-aaa".to_string(), "sn-1".to_string()];
        assert_eq!(
            violation(cluster.validate().unwrap_err()),
            (
                "autoscalingGroup.subnets.ids[1]".to_string(),
                "subnet".to_string()
            )
        );
    }

    #[test]
    fn test_policy_rules() {
        let mut cluster = valid_cluster();
        cluster.autoscaling_group.iam_instance_profile = Some(IamInstanceProfile {
            roles: Vec::new(),
            policy: Some(Policy {
                effect: "Permit".to_string(),
                action: vec!["s3:GetObject".to_string()],
            }),
        });
        assert_eq!(
            violation(cluster.validate().unwrap_err()),
            (
                "autoscalingGroup.iamInstanceProfile.policy.effect".to_string(),
                "effect".to_string()
            )
        );

        let mut cluster = valid_cluster();
        cluster.autoscaling_group.iam_instance_profile = Some(IamInstanceProfile {
            roles: vec!["existing-role".to_string()],
            policy: None,
        });
        assert!(cluster.validate().is_ok());
    }

    #[test]
    fn test_decode_keeps_default_tag_name() {
        let mut cluster = Cluster::new();
        let doc = serde_json::json!({
            "kind": "Cluster",
            "name": "web1",
            "autoscalingGroup": {"subnets": {"tag": "private"}}
        });
        cluster.decode(&doc).unwrap();

        assert_eq!(cluster.name, "web1");
        assert_eq!(cluster.autoscaling_group.subnets.tag, "private");
        assert_eq!(cluster.autoscaling_group.subnets.tag_name, "Name");
    }

    #[test]
    fn test_decode_schema_mismatch_reports_path() {
        let mut cluster = Cluster::new();
        let doc = serde_json::json!({
            "kind": "Cluster",
            "loadBalancer": {"healthCheck": {"interval": 30}}
        });
        match cluster.decode(&doc).unwrap_err() {
            StackError::SchemaMismatch { path, expected } => {
                assert_eq!(path, "loadBalancer.healthCheck.interval");
                assert_eq!(expected, "string");
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_region_hook() {
        assert_eq!(valid_cluster().region(), Some("us-west-2"));
        assert_eq!(Cluster::new().region(), None);
    }

    #[test]
    fn test_decode_legacy_iam_profile_spelling() {
        let mut cluster = Cluster::new();
        let doc = serde_json::json!({
            "kind": "Cluster",
            "autoscalingGroup": {
                "iamInstanceprofile": {"policy": {"effect": "Deny", "action": ["*"]}}
            }
        });
        cluster.decode(&doc).unwrap();

        let profile = cluster.autoscaling_group.iam_instance_profile.unwrap();
        assert_eq!(profile.policy.unwrap().effect, "Deny");
    }

    #[test]
    fn test_decode_legacy_iam_profile_type_is_checked() {
        let mut cluster = Cluster::new();
        let doc = serde_json::json!({
            "autoscalingGroup": {"iamInstanceprofile": {"roles": "web-role"}}
        });
        match cluster.decode(&doc).unwrap_err() {
            StackError::SchemaMismatch { path, .. } => {
                assert_eq!(path, "autoscalingGroup.iamInstanceProfile.roles");
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_both_iam_profile_spellings() {
        let mut cluster = Cluster::new();
        let doc = serde_json::json!({
            "autoscalingGroup": {
                "iamInstanceProfile": {"roles": ["a"]},
                "iamInstanceprofile": {"roles": ["b"]}
            }
        });
        assert!(matches!(
            cluster.decode(&doc),
            Err(StackError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_every_constraint_rule_is_standard() {
        let rules = RuleSet::standard();
        let table = Cluster::constraints();
        assert!(!table.is_empty());
        for constraint in table.constraints() {
            if let Some(rule) = &constraint.rule {
                assert!(rules.contains(rule), "{} uses unknown rule {}", constraint.path, rule);
            }
        }
    }
}
