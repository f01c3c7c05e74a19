/// Hub-spoke modeling principles. Shared by the AI review prompt and the MCP
/// server instructions.
pub const PRINCIPLES: &str = "\
1. The hub holds shared services only. Firewalls, gateways, bastion, DNS, identity, monitoring, \
backup and governance live in the hub and are consumed by every spoke. Workloads never live in the hub.\n\
2. Spokes hold workloads only. Compute, databases, storage, AI, analytics and integration services \
belong to a spoke. A spoke never hosts a firewall, gateway or shared identity service of its own.\n\
3. Key Vault is the one service that may appear on both sides. The hub vault holds shared secrets and \
certificates; each spoke vault holds that workload's secrets. They are distinct resources.\n\
4. Every hub carries its core baseline: Azure Firewall, Bastion and DNS, even when nothing network-related \
was requested.\n\
5. Every spoke peers to the hub. Spokes are never peered to each other and never reach the internet \
directly. Spoke-to-spoke, internet egress and on-premises traffic all cross the hub firewall or gateway.\n\
6. Address spaces never overlap. The hub owns 10.0.0.0/16, the production spoke 10.1.0.0/16 and the \
development spoke 10.2.0.0/16. Subnets stay inside their VNet and never overlap each other.\n\
7. Subnets follow tiers. A spoke gets a web, app, data or container subnet only when it hosts a service \
of that tier. Container subnets are /23 for pod density; the rest are /24.\n\
8. Ingress arrives through the hub application gateway, web talks to app over an internal load balancer, \
app reaches data over private endpoints, and integration flows through Service Bus queues.\n\
9. Gateway choice: VPN when a VPN gateway is requested, otherwise ExpressRoute when requested, otherwise none. \
Only one gateway is modeled.\n\
10. Zero-trust posture implies privileged identity management and conditional access in the hub.\n\
11. Unknown service names are reported, not guessed. An identifier that matches neither side is listed \
as unclassified rather than forced into the hub or a spoke.\n\
\n\
## Workflow\n\
1. `recommend_services` when starting from a free-text description, then `validate_service_names` to \
normalize names and catch typos per category.\n\
2. `classify_services` to preview the hub/spoke split and see unclassified identifiers.\n\
3. `synthesize_topology` to build the merged hub-spoke topology, or `validate_topology` to build it and \
check it against the rules above.\n\
4. `review_topology` for AI hints when an AI provider is configured.";
