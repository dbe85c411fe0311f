//! Region and network resource inventory seams
//!
//! The scanner and cleanup code only see these traits. [`Ec2Inventory`]
//! implements all three against the EC2 API, building a region-scoped
//! client from a shared SDK configuration for each call.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::Filter;
use costsweep_core::error::{CostsweepError, Result};
use tracing::{debug, info};

/// Lists the regions to scan
#[async_trait]
pub trait RegionDirectory: Send + Sync {
    /// Names of every region enabled for the account
    async fn list_regions(&self) -> Result<Vec<String>>;
}

/// Per-region listings of detached networking resources
#[async_trait]
pub trait NetworkInventory: Send + Sync {
    /// Ids of network interfaces in the `available` status
    async fn available_network_interfaces(&self, region: &str) -> Result<Vec<String>>;

    /// Allocation ids of addresses with no instance and no interface
    async fn unassociated_addresses(&self, region: &str) -> Result<Vec<String>>;
}

/// Single-resource cleanup actions
#[async_trait]
pub trait NetworkCleaner: Send + Sync {
    /// Delete a network interface
    async fn delete_network_interface(&self, region: &str, interface_id: &str) -> Result<()>;

    /// Release an elastic IP allocation
    async fn release_address(&self, region: &str, allocation_id: &str) -> Result<()>;
}

fn ec2_error<E>(err: &E) -> CostsweepError
where
    E: std::error::Error,
{
    CostsweepError::Ec2(DisplayErrorContext(err).to_string())
}

/// EC2-backed inventory and cleaner
#[derive(Clone)]
pub struct Ec2Inventory {
    sdk_config: SdkConfig,
}

impl Ec2Inventory {
    /// Create an inventory from loaded SDK configuration
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    fn home_client(&self) -> Client {
        Client::new(&self.sdk_config)
    }

    fn regional_client(&self, region: &str) -> Client {
        let config = aws_sdk_ec2::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        Client::from_conf(config)
    }
}

#[async_trait]
impl RegionDirectory for Ec2Inventory {
    async fn list_regions(&self) -> Result<Vec<String>> {
        let output = self
            .home_client()
            .describe_regions()
            .send()
            .await
            .map_err(|e| ec2_error(&e))?;

        let regions: Vec<String> = output
            .regions()
            .iter()
            .filter_map(|region| region.region_name().map(str::to_string))
            .collect();
        info!("Discovered {} regions", regions.len());
        Ok(regions)
    }
}

#[async_trait]
impl NetworkInventory for Ec2Inventory {
    async fn available_network_interfaces(&self, region: &str) -> Result<Vec<String>> {
        let client = self.regional_client(region);
        let mut interfaces = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = client
                .describe_network_interfaces()
                .filters(Filter::builder().name("status").values("available").build())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| ec2_error(&e))?;

            interfaces.extend(
                output
                    .network_interfaces()
                    .iter()
                    .filter_map(|eni| eni.network_interface_id().map(str::to_string)),
            );

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!("{}: {} available network interfaces", region, interfaces.len());
        Ok(interfaces)
    }

    async fn unassociated_addresses(&self, region: &str) -> Result<Vec<String>> {
        let output = self
            .regional_client(region)
            .describe_addresses()
            .send()
            .await
            .map_err(|e| ec2_error(&e))?;

        let addresses: Vec<String> = output
            .addresses()
            .iter()
            .filter(|address| {
                address.instance_id().is_none() && address.network_interface_id().is_none()
            })
            .filter_map(|address| address.allocation_id().map(str::to_string))
            .collect();

        debug!("{}: {} unassociated addresses", region, addresses.len());
        Ok(addresses)
    }
}

#[async_trait]
impl NetworkCleaner for Ec2Inventory {
    async fn delete_network_interface(&self, region: &str, interface_id: &str) -> Result<()> {
        self.regional_client(region)
            .delete_network_interface()
            .network_interface_id(interface_id)
            .send()
            .await
            .map_err(|e| ec2_error(&e))?;
        Ok(())
    }

    async fn release_address(&self, region: &str, allocation_id: &str) -> Result<()> {
        self.regional_client(region)
            .release_address()
            .allocation_id(allocation_id)
            .send()
            .await
            .map_err(|e| ec2_error(&e))?;
        Ok(())
    }
}
