//! Common test utilities and helpers for costsweep tests
//!
//! In-memory implementations of every backend trait, plus builders for
//! cost files and a valid configuration.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use costsweep::analyzer::Backends;
use costsweep_athena::service::{QueryService, QueryState, QueryStatus, ResultPage};
use costsweep_core::config::{AnalyzerConfig, QueryConfig, StorageConfig};
use costsweep_core::error::{CostsweepError, Result};
use costsweep_network::{NetworkCleaner, NetworkInventory, RegionDirectory};
use costsweep_trend::{CostObjectSource, object_key};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet, VecDeque};
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// Global mutex to serialize environment variable modifications in tests
pub static ENV_MUTEX: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

pub const SUFFIX: &str = "_sorted_costs.csv";

/// RAII guard restoring environment variables on drop
#[derive(Default)]
pub struct EnvVarGuard {
    vars: Vec<(String, Option<String>)>,
}

impl EnvVarGuard {
    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.push((key.to_string(), env::var(key).ok()));
        // env::set_var is unsafe since Rust 2024
        unsafe {
            env::set_var(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.vars.push((key.to_string(), env::var(key).ok()));
        unsafe {
            env::remove_var(key);
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.vars.iter().rev() {
            unsafe {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Render `(service, operation, cost)` rows as a daily cost file
pub fn cost_csv(rows: &[(&str, &str, f64)]) -> String {
    let mut out = String::from("service,operation,cost\n");
    for (service, operation, cost) in rows {
        out.push_str(&format!("{service},{operation},{cost}\n"));
    }
    out
}

/// A configuration that passes validation
pub fn test_config() -> AnalyzerConfig {
    AnalyzerConfig {
        storage: StorageConfig {
            bucket: Some("day-by-day".to_string()),
            ..Default::default()
        },
        query: QueryConfig {
            output_location: Some("s3://athena-results/costsweep/".to_string()),
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Daily cost objects held in memory
#[derive(Default)]
pub struct MemoryCostSource {
    objects: HashMap<String, String>,
    pub fetches: AtomicUsize,
}

impl MemoryCostSource {
    pub fn with_day(mut self, day: NaiveDate, rows: &[(&str, &str, f64)]) -> Self {
        self.objects.insert(object_key(day, SUFFIX), cost_csv(rows));
        self
    }

    pub fn with_raw(mut self, day: NaiveDate, content: &str) -> Self {
        self.objects.insert(object_key(day, SUFFIX), content.to_string());
        self
    }
}

#[async_trait]
impl CostObjectSource for MemoryCostSource {
    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.objects.get(key).cloned())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Scripted query service
pub struct FakeQueryService {
    final_state: QueryState,
    reason: Option<String>,
    pages: Mutex<VecDeque<ResultPage>>,
    pub starts: AtomicUsize,
    pub sql: Mutex<Vec<String>>,
}

impl FakeQueryService {
    /// Succeeds after one RUNNING check and returns `ids` in one page
    pub fn succeeding(ids: &[&str]) -> Self {
        let mut rows = vec![vec![Some("line_item_resource_id".to_string())]];
        rows.extend(ids.iter().map(|id| vec![Some(id.to_string())]));
        Self {
            final_state: QueryState::Succeeded,
            reason: None,
            pages: Mutex::new(VecDeque::from([ResultPage {
                rows,
                next_token: None,
            }])),
            starts: AtomicUsize::new(0),
            sql: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            final_state: QueryState::Failed,
            reason: Some(reason.to_string()),
            pages: Mutex::new(VecDeque::new()),
            starts: AtomicUsize::new(0),
            sql: Mutex::new(Vec::new()),
        }
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryService for FakeQueryService {
    async fn start_query(&self, sql: &str, _database: &str, _output: &str) -> Result<String> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.sql.lock().unwrap().push(sql.to_string());
        Ok("query-1".to_string())
    }

    async fn query_status(&self, _execution_id: &str) -> Result<QueryStatus> {
        Ok(QueryStatus {
            state: self.final_state.clone(),
            reason: self.reason.clone(),
        })
    }

    async fn result_page(
        &self,
        _execution_id: &str,
        _next_token: Option<String>,
    ) -> Result<ResultPage> {
        Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
    }
}

/// In-memory EC2 state
#[derive(Default)]
pub struct FakeEc2 {
    regions: Vec<String>,
    directory_error: Option<String>,
    interfaces: HashMap<String, Vec<String>>,
    addresses: HashMap<String, Vec<String>>,
    failing_regions: HashSet<String>,
    cleanup_error: Option<String>,
    pub region_calls: AtomicUsize,
    pub cleanups: Mutex<Vec<String>>,
}

impl FakeEc2 {
    pub fn with_region(mut self, region: &str, interfaces: &[&str], addresses: &[&str]) -> Self {
        self.regions.push(region.to_string());
        self.interfaces.insert(
            region.to_string(),
            interfaces.iter().map(|s| s.to_string()).collect(),
        );
        self.addresses.insert(
            region.to_string(),
            addresses.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn with_failing_region(mut self, region: &str) -> Self {
        self.regions.push(region.to_string());
        self.failing_regions.insert(region.to_string());
        self
    }

    pub fn with_directory_error(mut self, message: &str) -> Self {
        self.directory_error = Some(message.to_string());
        self
    }

    pub fn with_cleanup_error(mut self, message: &str) -> Self {
        self.cleanup_error = Some(message.to_string());
        self
    }

    fn cleanup(&self, call: String) -> Result<()> {
        self.cleanups.lock().unwrap().push(call);
        match &self.cleanup_error {
            Some(message) => Err(CostsweepError::Ec2(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RegionDirectory for FakeEc2 {
    async fn list_regions(&self) -> Result<Vec<String>> {
        self.region_calls.fetch_add(1, Ordering::SeqCst);
        match &self.directory_error {
            Some(message) => Err(CostsweepError::Ec2(message.clone())),
            None => Ok(self.regions.clone()),
        }
    }
}

#[async_trait]
impl NetworkInventory for FakeEc2 {
    async fn available_network_interfaces(&self, region: &str) -> Result<Vec<String>> {
        if self.failing_regions.contains(region) {
            return Err(CostsweepError::Ec2(format!(
                "UnauthorizedOperation in {region}"
            )));
        }
        Ok(self.interfaces.get(region).cloned().unwrap_or_default())
    }

    async fn unassociated_addresses(&self, region: &str) -> Result<Vec<String>> {
        Ok(self.addresses.get(region).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl NetworkCleaner for FakeEc2 {
    async fn delete_network_interface(&self, region: &str, interface_id: &str) -> Result<()> {
        self.cleanup(format!("delete_network_interface {region} {interface_id}"))
    }

    async fn release_address(&self, region: &str, allocation_id: &str) -> Result<()> {
        self.cleanup(format!("release_address {region} {allocation_id}"))
    }
}

/// Wire fakes into a backend set
pub fn backends(
    source: Arc<MemoryCostSource>,
    query: Arc<FakeQueryService>,
    ec2: Arc<FakeEc2>,
) -> Backends {
    Backends {
        cost_source: source,
        query_service: query,
        regions: ec2.clone(),
        inventory: ec2.clone(),
        cleaner: ec2,
    }
}
