//! Template construction for `Cluster`.

use serde_json::{json, Value};

use super::{Cluster, IamInstanceProfile, LoadBalancer, ASG_SUBNETS_KEY, LB_SUBNETS_KEY};
use crate::context::RenderContext;
use crate::error::StackResult;
use crate::template::{get_att, reference, Resource, Template};

pub const VPC_CIDR_BLOCK: &str = "10.0.0.0/16";
const POLICY_VERSION: &str = "2012-10-17";
const LISTENER_PORT: &str = "80";

impl Cluster {
    /// Build the template for this cluster.
    ///
    /// Subnet ids come from `ctx`, which `before_render` fills in; nothing
    /// here touches the network.
    pub fn build_template(&self, ctx: &RenderContext) -> StackResult<Template> {
        let asg_subnets: Vec<String> = ctx.require(ASG_SUBNETS_KEY)?;
        let mut template = Template::new().with_description(format!("bossformation cluster {}", self.name));

        template.add_resource(
            "VPC",
            Resource::new("AWS::EC2::VPC")
                .property("CidrBlock", json!(VPC_CIDR_BLOCK))
                .property("EnableDnsSupport", json!(true))
                .property("EnableDnsHostnames", json!(true))
                .property("Tags", self.name_tags()),
        )?;

        let has_profile = match &self.autoscaling_group.iam_instance_profile {
            Some(profile) => {
                self.add_iam_resources(&mut template, profile)?;
                true
            }
            None => false,
        };

        let mut launch_config = Resource::new("AWS::AutoScaling::LaunchConfiguration")
            .property("ImageId", json!(self.autoscaling_group.image))
            .property("InstanceType", json!(self.autoscaling_group.instance_type));
        if has_profile {
            launch_config = launch_config.property("IamInstanceProfile", reference("InstanceProfile"));
        }
        template.add_resource("LaunchConfiguration", launch_config)?;

        let mut group = Resource::new("AWS::AutoScaling::AutoScalingGroup")
            .property("LaunchConfigurationName", reference("LaunchConfiguration"))
            .property("MinSize", json!("1"))
            .property("MaxSize", json!("1"))
            .property("VPCZoneIdentifier", json!(asg_subnets))
            .property(
                "Tags",
                json!([{ "Key": "Name", "Value": self.name, "PropagateAtLaunch": true }]),
            );

        if let Some(lb) = &self.load_balancer {
            let lb_subnets: Vec<String> = ctx.require(LB_SUBNETS_KEY)?;
            self.add_load_balancer(&mut template, lb, lb_subnets)?;
            group = group.property("LoadBalancerNames", json!([reference("LoadBalancer")]));
            template.add_output(
                "LoadBalancerDNSName",
                Some("DNS name of the load balancer".to_string()),
                get_att("LoadBalancer", "DNSName"),
            );
        }

        template.add_resource("AutoScalingGroup", group)?;
        template.add_output(
            "AutoScalingGroupName",
            Some("Name of the autoscaling group".to_string()),
            reference("AutoScalingGroup"),
        );

        Ok(template)
    }

    fn name_tags(&self) -> Value {
        json!([{ "Key": "Name", "Value": self.name }])
    }

    fn add_iam_resources(&self, template: &mut Template, profile: &IamInstanceProfile) -> StackResult<()> {
        // Existing roles are attached as-is; otherwise an EC2 role is created.
        let roles = if profile.roles.is_empty() {
            template.add_resource(
                "InstanceRole",
                Resource::new("AWS::IAM::Role")
                    .property("Path", json!("/"))
                    .property(
                        "AssumeRolePolicyDocument",
                        json!({
                            "Version": POLICY_VERSION,
                            "Statement": [{
                                "Effect": "Allow",
                                "Principal": { "Service": ["ec2.amazonaws.com"] },
                                "Action": ["sts:AssumeRole"]
                            }]
                        }),
                    ),
            )?;
            json!([reference("InstanceRole")])
        } else {
            json!(profile.roles)
        };

        if let Some(policy) = &profile.policy {
            template.add_resource(
                "InstancePolicy",
                Resource::new("AWS::IAM::Policy")
                    .property("PolicyName", json!(format!("{}-instance-policy", self.name)))
                    .property(
                        "PolicyDocument",
                        json!({
                            "Version": POLICY_VERSION,
                            "Statement": [{
                                "Effect": policy.effect,
                                "Action": policy.action,
                                "Resource": "*"
                            }]
                        }),
                    )
                    .property("Roles", roles.clone()),
            )?;
        }

        template.add_resource(
            "InstanceProfile",
            Resource::new("AWS::IAM::InstanceProfile")
                .property("Path", json!("/"))
                .property("Roles", roles),
        )
    }

    fn add_load_balancer(
        &self,
        template: &mut Template,
        lb: &LoadBalancer,
        subnets: Vec<String>,
    ) -> StackResult<()> {
        let health_check = &lb.health_check;
        let mut balancer = Resource::new("AWS::ElasticLoadBalancing::LoadBalancer")
            .property("Scheme", json!(lb.scheme))
            .property("Subnets", json!(subnets))
            .property(
                "Listeners",
                json!([{
                    "LoadBalancerPort": LISTENER_PORT,
                    "InstancePort": LISTENER_PORT,
                    "Protocol": "HTTP"
                }]),
            )
            .property(
                "HealthCheck",
                json!({
                    "Target": format!("HTTP:{}/{}", LISTENER_PORT, health_check.target),
                    "HealthyThreshold": health_check.healthy_threshold,
                    "UnhealthyThreshold": health_check.unhealthy_threshold,
                    "Interval": health_check.interval,
                    "Timeout": health_check.timeout
                }),
            )
            .property("Tags", self.name_tags());

        if lb.public {
            template.add_resource(
                "LoadBalancerSecurityGroup",
                Resource::new("AWS::EC2::SecurityGroup")
                    .property(
                        "GroupDescription",
                        json!(format!("Public access to {} load balancer", self.name)),
                    )
                    .property("VpcId", json!(self.vpc_id))
                    .property(
                        "SecurityGroupIngress",
                        json!([{
                            "IpProtocol": "tcp",
                            "FromPort": LISTENER_PORT,
                            "ToPort": LISTENER_PORT,
                            "CidrIp": "0.0.0.0/0"
                        }]),
                    ),
            )?;
            balancer = balancer.property("SecurityGroups", json!([reference("LoadBalancerSecurityGroup")]));
        }

        template.add_resource("LoadBalancer", balancer)
    }
}
