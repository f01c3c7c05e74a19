//! Spoke synthesis: workload VNets, tier placement, data flow, dependencies
//! on the hub and scaling policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::cidr::{Cidr, SubnetAllocator};
use crate::hub::{HubContext, VirtualNetwork};
use crate::service::{ServiceId, ServiceSet};
use crate::taxonomy::Taxonomy;
use crate::{Request, Scalability};

pub struct SpokeDefinition {
    pub key: &'static str,
    pub vnet_name: &'static str,
    pub address_space: Cidr,
}

/// Every topology carries these two spokes, built from the same service list.
pub const SPOKES: [SpokeDefinition; 2] = [
    SpokeDefinition {
        key: "production_spoke",
        vnet_name: "Production-Spoke-VNet",
        address_space: Cidr::from_octets([10, 1, 0, 0], 16),
    },
    SpokeDefinition {
        key: "development_spoke",
        vnet_name: "Development-Spoke-VNet",
        address_space: Cidr::from_octets([10, 2, 0, 0], 16),
    },
];

pub const WEB_TIER_SUBNET: &str = "WebTierSubnet";
pub const APP_TIER_SUBNET: &str = "AppTierSubnet";
pub const DATA_TIER_SUBNET: &str = "DataTierSubnet";
pub const CONTAINER_SUBNET: &str = "ContainerSubnet";

const TIER_PREFIX: u8 = 24;
// pods need the extra room
const CONTAINER_PREFIX: u8 = 23;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierServices {
    pub web_tier: Vec<ServiceId>,
    pub application_tier: Vec<ServiceId>,
    pub data_tier: Vec<ServiceId>,
    pub integration_tier: Vec<ServiceId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSpoke {
    pub vnet: VirtualNetwork,
    pub services: TierServices,
    pub peering_to_hub: bool,
    /// Name of the hub VNet this spoke peers with.
    pub hub_vnet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPath {
    ViaHubApplicationGateway,
    InternalLoadBalancer,
    PrivateEndpoints,
    ServiceBusQueues,
    ViaHubFirewall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFlow {
    pub ingress: FlowPath,
    pub web_to_app: FlowPath,
    pub app_to_data: FlowPath,
    pub integration_flow: FlowPath,
    pub egress: FlowPath,
}

impl Default for DataFlow {
    fn default() -> Self {
        Self {
            ingress: FlowPath::ViaHubApplicationGateway,
            web_to_app: FlowPath::InternalLoadBalancer,
            app_to_data: FlowPath::PrivateEndpoints,
            integration_flow: FlowPath::ServiceBusQueues,
            egress: FlowPath::ViaHubFirewall,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubDependencies {
    pub dns_resolution: String,
    pub internet_access: String,
    pub backup_services: String,
    pub monitoring: String,
    pub identity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalDependencies {
    pub app_depends_on: Vec<ServiceId>,
    pub web_depends_on: Vec<ServiceId>,
    pub integration_depends_on: Vec<ServiceId>,
}

/// Declared structurally; entries are not filtered by what was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDependencies {
    pub hub_dependencies: HubDependencies,
    pub spoke_internal_dependencies: InternalDependencies,
}

impl Default for ResourceDependencies {
    fn default() -> Self {
        Self {
            hub_dependencies: HubDependencies {
                dns_resolution: "hub_dns".to_string(),
                internet_access: "hub_firewall".to_string(),
                backup_services: "hub_recovery_vault".to_string(),
                monitoring: "hub_log_analytics".to_string(),
                identity: "hub_azure_ad".to_string(),
            },
            spoke_internal_dependencies: InternalDependencies {
                app_depends_on: vec!["sql_database".into(), "storage_accounts".into()],
                web_depends_on: vec!["app_services".into()],
                integration_depends_on: vec!["service_bus".into(), "api_management".into()],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicies {
    pub scale_out_threshold: u8,
    pub scale_in_threshold: u8,
    pub min_instances: u32,
    pub max_instances: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingConfiguration {
    pub auto_scaling: bool,
    pub scaling_metrics: Vec<String>,
    pub scaling_policies: ScalingPolicies,
}

impl ScalingConfiguration {
    pub fn for_tier(scalability: Scalability) -> Self {
        let high = scalability == Scalability::High;
        Self {
            auto_scaling: matches!(scalability, Scalability::High | Scalability::Elastic),
            scaling_metrics: ["cpu_utilization", "memory_utilization", "request_count"]
                .into_iter()
                .map(String::from)
                .collect(),
            scaling_policies: ScalingPolicies {
                scale_out_threshold: 70,
                scale_in_threshold: 30,
                min_instances: if high { 2 } else { 1 },
                max_instances: if high { 20 } else { 10 },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpokeContext {
    pub spoke_services: ServiceSet,
    pub workload_components: BTreeMap<String, WorkloadSpoke>,
    pub data_flow: DataFlow,
    pub resource_dependencies: ResourceDependencies,
    pub scaling_configuration: ScalingConfiguration,
}

/// Build the workload side. `hub` is only read: each spoke records the hub
/// VNet it peers with.
pub fn synthesize(
    request: &Request,
    spoke_ids: &ServiceSet,
    hub: &HubContext,
    taxonomy: &Taxonomy,
) -> SpokeContext {
    let hub_vnet = &hub.network_topology.hub_vnet.name;
    let services = tier_services(spoke_ids, taxonomy);

    let workload_components = SPOKES
        .iter()
        .map(|def| {
            let spoke = WorkloadSpoke {
                vnet: VirtualNetwork {
                    name: def.vnet_name.to_string(),
                    address_space: def.address_space,
                    subnets: spoke_subnets(def.address_space, spoke_ids, taxonomy),
                },
                services: services.clone(),
                // always peered, even to a hub holding only the core services
                peering_to_hub: true,
                hub_vnet: hub_vnet.clone(),
            };
            debug!(spoke = def.key, subnets = spoke.vnet.subnets.len(), "spoke vnet derived");
            (def.key.to_string(), spoke)
        })
        .collect();

    SpokeContext {
        spoke_services: spoke_ids.clone(),
        workload_components,
        data_flow: DataFlow::default(),
        resource_dependencies: ResourceDependencies::default(),
        scaling_configuration: ScalingConfiguration::for_tier(request.scalability),
    }
}

fn has_any(spoke_ids: &ServiceSet, group: &[ServiceId]) -> bool {
    group.iter().any(|id| spoke_ids.contains(id.as_str()))
}

/// Present tiers take consecutive blocks in web, app, data, container order.
/// The first /24 of the spoke is left free.
pub fn spoke_subnets(
    address_space: Cidr,
    spoke_ids: &ServiceSet,
    taxonomy: &Taxonomy,
) -> BTreeMap<String, Cidr> {
    let tiers = &taxonomy.tiers;
    let plan = [
        (WEB_TIER_SUBNET, &tiers.web, TIER_PREFIX),
        (APP_TIER_SUBNET, &tiers.compute, TIER_PREFIX),
        (DATA_TIER_SUBNET, &tiers.database, TIER_PREFIX),
        (CONTAINER_SUBNET, &tiers.container, CONTAINER_PREFIX),
    ];

    let mut alloc = SubnetAllocator::new(address_space);
    if alloc.skip(TIER_PREFIX).is_none() {
        debug!(%address_space, "address space too small for tier subnets");
        return BTreeMap::new();
    }

    let mut subnets = BTreeMap::new();
    for (name, group, prefix) in plan {
        if !has_any(spoke_ids, group) {
            continue;
        }
        if let Some(block) = alloc.next_block(prefix) {
            subnets.insert(name.to_string(), block);
        }
    }
    subnets
}

/// First matching tier wins; ids in no tier are left out.
pub fn tier_services(spoke_ids: &ServiceSet, taxonomy: &Taxonomy) -> TierServices {
    let tiers = &taxonomy.tiers;
    let mut out = TierServices::default();
    for id in spoke_ids {
        let bucket = if tiers.web.contains(id) {
            &mut out.web_tier
        } else if tiers.compute.contains(id) {
            &mut out.application_tier
        } else if tiers.database.contains(id) {
            &mut out.data_tier
        } else if tiers.integration.contains(id) {
            &mut out.integration_tier
        } else {
            continue;
        };
        bucket.push(id.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{hub, Category, Classifier};
    use std::sync::Arc;

    fn spoke_for(req: &Request) -> SpokeContext {
        let tax = Arc::new(Taxonomy::azure());
        let c = Classifier::new(tax.clone()).classify(req);
        let hub_ctx = hub::synthesize(req, &c.hub, &tax);
        synthesize(req, &c.spoke, &hub_ctx, &tax)
    }

    fn subnets(ctx: &SpokeContext, spoke: &str) -> Vec<(String, String)> {
        ctx.workload_components[spoke]
            .vnet
            .subnets
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
    }

    #[test]
    fn always_two_spokes() {
        let ctx = spoke_for(&Request::default());
        let keys: Vec<&str> = ctx.workload_components.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["development_spoke", "production_spoke"]);
        let prod = &ctx.workload_components["production_spoke"];
        assert_eq!(prod.vnet.name, "Production-Spoke-VNet");
        assert_eq!(prod.vnet.address_space.to_string(), "10.1.0.0/16");
        assert!(prod.vnet.subnets.is_empty());
        assert!(prod.peering_to_hub);
        assert_eq!(prod.hub_vnet, "Hub-VNet");
        let dev = &ctx.workload_components["development_spoke"];
        assert_eq!(dev.vnet.address_space.to_string(), "10.2.0.0/16");
    }

    #[test]
    fn full_tier_layout() {
        let req = Request::default()
            .with(Category::Compute, ["app_services", "aks"])
            .with(Category::Database, ["sql_database"]);
        let ctx = spoke_for(&req);
        assert_eq!(
            subnets(&ctx, "production_spoke"),
            pairs(&[
                ("AppTierSubnet", "10.1.2.0/24"),
                ("ContainerSubnet", "10.1.4.0/23"),
                ("DataTierSubnet", "10.1.3.0/24"),
                ("WebTierSubnet", "10.1.1.0/24"),
            ])
        );
        assert_eq!(
            subnets(&ctx, "development_spoke"),
            pairs(&[
                ("AppTierSubnet", "10.2.2.0/24"),
                ("ContainerSubnet", "10.2.4.0/23"),
                ("DataTierSubnet", "10.2.3.0/24"),
                ("WebTierSubnet", "10.2.1.0/24"),
            ])
        );
    }

    #[test]
    fn absent_tiers_take_no_space() {
        let ctx = spoke_for(&Request::default().with(Category::Database, ["cosmos_db"]));
        assert_eq!(subnets(&ctx, "production_spoke"), pairs(&[("DataTierSubnet", "10.1.1.0/24")]));
    }

    #[test]
    fn container_block_is_aligned() {
        let ctx = spoke_for(&Request::default().with(Category::Compute, ["container_instances"]));
        assert_eq!(subnets(&ctx, "production_spoke"), pairs(&[("ContainerSubnet", "10.1.2.0/23")]));

        let ctx = spoke_for(&Request::default().with(Category::Compute, ["aks"]));
        assert_eq!(
            subnets(&ctx, "production_spoke"),
            pairs(&[("AppTierSubnet", "10.1.1.0/24"), ("ContainerSubnet", "10.1.2.0/23")])
        );
    }

    #[test]
    fn undersized_address_space_gets_no_subnets() {
        let tax = Taxonomy::azure();
        let ids: ServiceSet = [ServiceId::new("app_services")].into_iter().collect();
        let tiny: Cidr = "10.9.0.0/25".parse().unwrap();
        assert!(spoke_subnets(tiny, &ids, &tax).is_empty());
    }

    #[test]
    fn tiers_place_each_id_once() {
        let req = Request::default()
            .with(Category::Compute, ["web_apps", "aks", "batch"])
            .with(Category::Database, ["postgresql", "redis"])
            .with(Category::Integration, ["service_bus", "logic_apps"]);
        let ctx = spoke_for(&req);
        let t = &ctx.workload_components["production_spoke"].services;
        assert_eq!(t.web_tier, vec![ServiceId::new("web_apps")]);
        assert_eq!(t.application_tier, vec![ServiceId::new("aks")]);
        assert_eq!(t.data_tier, vec![ServiceId::new("postgresql")]);
        assert_eq!(t.integration_tier, vec![ServiceId::new("service_bus")]);
        // untiered ids still belong to the spoke
        assert!(ctx.spoke_services.contains("batch"));
        assert!(ctx.spoke_services.contains("redis_cache"));
        assert!(ctx.spoke_services.contains("logic_apps"));
    }

    #[test]
    fn scaling_follows_scalability() {
        let low = ScalingConfiguration::for_tier(Scalability::Low);
        assert!(!low.auto_scaling);
        assert_eq!(low.scaling_policies.min_instances, 1);
        assert_eq!(low.scaling_policies.max_instances, 10);

        let high = ScalingConfiguration::for_tier(Scalability::High);
        assert!(high.auto_scaling);
        assert_eq!(high.scaling_policies.min_instances, 2);
        assert_eq!(high.scaling_policies.max_instances, 20);
        assert_eq!(high.scaling_policies.scale_out_threshold, 70);
        assert_eq!(high.scaling_policies.scale_in_threshold, 30);

        let elastic = ScalingConfiguration::for_tier(Scalability::Elastic);
        assert!(elastic.auto_scaling);
        assert_eq!(elastic.scaling_policies.min_instances, 1);
        assert_eq!(elastic.scaling_policies.max_instances, 10);
    }

    #[test]
    fn fixed_flow_and_dependency_vocabulary() {
        let ctx = spoke_for(&Request::default());
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["data_flow"]["ingress"], "via_hub_application_gateway");
        assert_eq!(json["data_flow"]["egress"], "via_hub_firewall");
        assert_eq!(json["resource_dependencies"]["hub_dependencies"]["identity"], "hub_azure_ad");
        assert_eq!(
            json["resource_dependencies"]["spoke_internal_dependencies"]["app_depends_on"],
            serde_json::json!(["sql_database", "storage_accounts"])
        );
        assert_eq!(
            json["workload_components"]["production_spoke"]["vnet"]["address_space"],
            "10.1.0.0/16"
        );
    }
}
