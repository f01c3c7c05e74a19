//! Hub synthesis: the shared VNet, its gateway, the baseline shared services
//! and the routing rules every spoke inherits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::cidr::Cidr;
use crate::service::ServiceSet;
use crate::taxonomy::Taxonomy;
use crate::{BackupPolicy, Request, SecurityPosture};

pub const HUB_VNET_NAME: &str = "Hub-VNet";
pub const HUB_ADDRESS_SPACE: Cidr = Cidr::from_octets([10, 0, 0, 0], 16);

/// Fixed hub subnets. Azure requires these exact names for the firewall,
/// bastion and gateway subnets.
pub const HUB_SUBNETS: [(&str, Cidr); 4] = [
    ("AzureFirewallSubnet", Cidr::from_octets([10, 0, 1, 0], 26)),
    ("AzureBastionSubnet", Cidr::from_octets([10, 0, 2, 0], 27)),
    ("GatewaySubnet", Cidr::from_octets([10, 0, 3, 0], 27)),
    ("SharedServicesSubnet", Cidr::from_octets([10, 0, 4, 0], 24)),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualNetwork {
    pub name: String,
    pub address_space: Cidr,
    pub subnets: BTreeMap<String, Cidr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind {
    Vpn,
    Expressroute,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(rename = "type")]
    pub kind: GatewayKind,
    pub sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeeringConfiguration {
    pub allow_virtual_network_access: bool,
    pub allow_forwarded_traffic: bool,
    pub allow_gateway_transit: bool,
    pub use_remote_gateways: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubNetwork {
    pub hub_vnet: VirtualNetwork,
    pub gateway_config: GatewayConfig,
    pub peering_configuration: PeeringConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityServices {
    pub azure_ad: bool,
    pub managed_identity: bool,
    pub privileged_identity_management: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringServices {
    pub log_analytics_workspace: bool,
    pub azure_monitor: bool,
    pub application_insights: bool,
    pub azure_sentinel: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupServices {
    pub recovery_services_vault: bool,
    pub azure_backup: bool,
    pub site_recovery: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceServices {
    pub azure_policy: bool,
    pub management_groups: bool,
    pub cost_management: bool,
    pub azure_advisor: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedInfrastructure {
    pub identity_services: IdentityServices,
    pub monitoring_services: MonitoringServices,
    pub backup_services: BackupServices,
    pub governance_services: GovernanceServices,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSecurity {
    pub default_deny_all: bool,
    pub firewall_rules: Vec<String>,
    pub nsg_rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySecurity {
    pub mfa_required: bool,
    pub conditional_access: bool,
    pub zero_trust: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProtection {
    pub encryption_in_transit: bool,
    pub encryption_at_rest: bool,
    pub key_management: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityPolicies {
    pub network_security: NetworkSecurity,
    pub identity_security: IdentitySecurity,
    pub data_protection: DataProtection,
}

/// How traffic between two parties is carried. There is deliberately no
/// direct spoke-to-spoke or spoke-to-internet mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityMode {
    VnetPeering,
    ViaHubFirewall,
    ViaHubGateway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    HubFirewall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficFlow {
    pub north_south: RouteTarget,
    pub east_west: RouteTarget,
    pub spoke_to_internet: RouteTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityMatrix {
    pub hub_to_spoke_connectivity: ConnectivityMode,
    pub spoke_to_spoke_connectivity: ConnectivityMode,
    pub internet_connectivity: ConnectivityMode,
    pub on_premises_connectivity: ConnectivityMode,
    pub traffic_flow: TrafficFlow,
}

impl ConnectivityMatrix {
    /// All east-west, north-south and internet traffic crosses the hub.
    pub fn through_hub() -> Self {
        Self {
            hub_to_spoke_connectivity: ConnectivityMode::VnetPeering,
            spoke_to_spoke_connectivity: ConnectivityMode::ViaHubFirewall,
            internet_connectivity: ConnectivityMode::ViaHubFirewall,
            on_premises_connectivity: ConnectivityMode::ViaHubGateway,
            traffic_flow: TrafficFlow {
                north_south: RouteTarget::HubFirewall,
                east_west: RouteTarget::HubFirewall,
                spoke_to_internet: RouteTarget::HubFirewall,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubContext {
    pub hub_services: ServiceSet,
    pub network_topology: HubNetwork,
    pub shared_infrastructure: SharedInfrastructure,
    pub security_policies: SecurityPolicies,
    pub connectivity_matrix: ConnectivityMatrix,
}

pub fn synthesize(request: &Request, hub_ids: &ServiceSet, taxonomy: &Taxonomy) -> HubContext {
    let network_topology = network_topology(hub_ids, taxonomy);
    debug!(
        gateway = ?network_topology.gateway_config.kind,
        "hub network derived"
    );

    HubContext {
        hub_services: hub_ids.clone(),
        network_topology,
        shared_infrastructure: shared_infrastructure(request, hub_ids, taxonomy),
        security_policies: security_policies(request),
        connectivity_matrix: ConnectivityMatrix::through_hub(),
    }
}

fn has_any(hub_ids: &ServiceSet, group: &[crate::ServiceId]) -> bool {
    group.iter().any(|id| hub_ids.contains(id.as_str()))
}

fn network_topology(hub_ids: &ServiceSet, taxonomy: &Taxonomy) -> HubNetwork {
    let subnets = HUB_SUBNETS
        .iter()
        .map(|(name, cidr)| (name.to_string(), *cidr))
        .collect();

    // VPN wins over ExpressRoute when both are requested
    let gateway_config = if has_any(hub_ids, &taxonomy.features.vpn_gateway) {
        GatewayConfig {
            kind: GatewayKind::Vpn,
            sku: Some("VpnGw2".to_string()),
        }
    } else if has_any(hub_ids, &taxonomy.features.expressroute) {
        GatewayConfig {
            kind: GatewayKind::Expressroute,
            sku: Some("Standard".to_string()),
        }
    } else {
        GatewayConfig {
            kind: GatewayKind::None,
            sku: None,
        }
    };

    HubNetwork {
        hub_vnet: VirtualNetwork {
            name: HUB_VNET_NAME.to_string(),
            address_space: HUB_ADDRESS_SPACE,
            subnets,
        },
        gateway_config,
        peering_configuration: PeeringConfiguration {
            allow_virtual_network_access: true,
            allow_forwarded_traffic: true,
            allow_gateway_transit: true,
            use_remote_gateways: false,
        },
    }
}

fn shared_infrastructure(
    request: &Request,
    hub_ids: &ServiceSet,
    taxonomy: &Taxonomy,
) -> SharedInfrastructure {
    SharedInfrastructure {
        identity_services: IdentityServices {
            azure_ad: true,
            managed_identity: true,
            privileged_identity_management: request.security_posture == SecurityPosture::ZeroTrust,
        },
        monitoring_services: MonitoringServices {
            log_analytics_workspace: true,
            azure_monitor: true,
            application_insights: true,
            azure_sentinel: has_any(hub_ids, &taxonomy.features.sentinel),
        },
        backup_services: BackupServices {
            recovery_services_vault: true,
            azure_backup: true,
            site_recovery: request.backup == BackupPolicy::Comprehensive,
        },
        governance_services: GovernanceServices {
            azure_policy: true,
            management_groups: true,
            cost_management: true,
            azure_advisor: true,
        },
    }
}

fn security_policies(request: &Request) -> SecurityPolicies {
    SecurityPolicies {
        network_security: NetworkSecurity {
            default_deny_all: true,
            firewall_rules: Vec::new(),
            nsg_rules: Vec::new(),
        },
        identity_security: IdentitySecurity {
            mfa_required: true,
            conditional_access: true,
            zero_trust: request.security_posture == SecurityPosture::ZeroTrust,
        },
        data_protection: DataProtection {
            encryption_in_transit: true,
            encryption_at_rest: true,
            key_management: "azure_key_vault".to_string(),
        },
    }
}
