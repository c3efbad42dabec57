use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_route53::types::{
    AliasTarget, Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use aws_sdk_route53::Client as Route53Client;
use tracing::{error, info};

use crate::error::RoutingError;
use crate::state::{RouteTarget, RoutingPair, RoutingRecord, WeightBatch, WeightChange};

/// Page size for the record listing. The weighted pair usually fits in the first page.
const LIST_MAX_ITEMS: i32 = 10;

/// Weighted DNS routing for the public API hostname.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait TrafficRouter: Send + Sync {
    async fn list_records(
        &self,
        hostname: &str,
        record_type: &str,
    ) -> Result<Vec<RoutingRecord>, RoutingError>;

    /// Submits both weight updates as one change and returns its identifier.
    async fn apply_weight_change(
        &self,
        hostname: &str,
        batch: &WeightBatch,
    ) -> Result<String, RoutingError>;
}

/// Reads the current routing records and resolves the primary/dr pair.
pub async fn read_routing_pair<R>(
    router: &R,
    hostname: &str,
    record_type: &str,
) -> Result<RoutingPair, RoutingError>
where
    R: TrafficRouter + ?Sized,
{
    let records = router.list_records(hostname, record_type).await?;
    RoutingPair::from_records(records, hostname, record_type)
}

pub struct Route53Router {
    client: Route53Client,
    hosted_zone_id: String,
}

impl Route53Router {
    pub fn new(client: Route53Client, hosted_zone_id: impl Into<String>) -> Self {
        Self {
            client,
            hosted_zone_id: hosted_zone_id.into(),
        }
    }

    pub fn from_sdk_config(config: &SdkConfig, hosted_zone_id: impl Into<String>) -> Self {
        Self::new(Route53Client::new(config), hosted_zone_id)
    }
}

#[async_trait]
impl TrafficRouter for Route53Router {
    async fn list_records(
        &self,
        hostname: &str,
        record_type: &str,
    ) -> Result<Vec<RoutingRecord>, RoutingError> {
        let mut records = Vec::new();
        let mut start_name = hostname.to_string();
        let mut start_type = RrType::from(record_type);
        let mut start_identifier: Option<String> = None;

        loop {
            let output = self
                .client
                .list_resource_record_sets()
                .hosted_zone_id(&self.hosted_zone_id)
                .start_record_name(&start_name)
                .start_record_type(start_type.clone())
                .set_start_record_identifier(start_identifier.take())
                .max_items(LIST_MAX_ITEMS)
                .send()
                .await
                .map_err(|e| {
                    error!("Failed to list record sets for {}: {}", hostname, e);
                    RoutingError::Lookup(e.to_string())
                })?;

            let sets = output.resource_record_sets();
            for set in sets.iter().filter(|set| {
                set.set_identifier().is_some() && is_listed_name(set, hostname, record_type)
            }) {
                records.push(routing_record_from_set(set)?);
            }

            if !listing_continues(sets, output.is_truncated(), hostname, record_type) {
                break;
            }
            match (output.next_record_name(), output.next_record_type()) {
                (Some(name), Some(next_type)) => {
                    start_name = name.to_string();
                    start_type = next_type.clone();
                    start_identifier = output.next_record_identifier().map(str::to_string);
                }
                _ => {
                    return Err(RoutingError::Lookup(format!(
                        "record listing for {} was truncated without a continuation",
                        hostname
                    )))
                }
            }
        }

        Ok(records)
    }

    async fn apply_weight_change(
        &self,
        hostname: &str,
        batch: &WeightBatch,
    ) -> Result<String, RoutingError> {
        let mut changes = Vec::with_capacity(2);
        for change in batch.changes() {
            changes.push(upsert_change(change)?);
        }

        let change_batch = ChangeBatch::builder()
            .comment(batch.comment())
            .set_changes(Some(changes))
            .build()
            .map_err(|e| RoutingError::Update(e.to_string()))?;

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(&self.hosted_zone_id)
            .change_batch(change_batch)
            .send()
            .await
            .map_err(|e| {
                error!("Route53 rejected weight change for {}: {}", hostname, e);
                RoutingError::Update(e.to_string())
            })?;

        let change_id = output
            .change_info()
            .map(|info| info.id().to_string())
            .ok_or_else(|| RoutingError::Update("response carried no change info".to_string()))?;

        info!(
            "Submitted weight change {} for {}: {:?}",
            change_id,
            hostname,
            batch.weights()
        );

        Ok(change_id)
    }
}

// The listing starts at `hostname` but runs on into the following names.
fn is_listed_name(set: &ResourceRecordSet, hostname: &str, record_type: &str) -> bool {
    set.name()
        .trim_end_matches('.')
        .eq_ignore_ascii_case(hostname.trim_end_matches('.'))
        && set.r#type().as_str().eq_ignore_ascii_case(record_type)
}

// Listing is sorted by name and type, so once a page ends past the monitored
// name nothing further can match.
fn listing_continues(
    sets: &[ResourceRecordSet],
    is_truncated: bool,
    hostname: &str,
    record_type: &str,
) -> bool {
    is_truncated
        && sets
            .last()
            .is_some_and(|set| is_listed_name(set, hostname, record_type))
}

fn routing_record_from_set(set: &ResourceRecordSet) -> Result<RoutingRecord, RoutingError> {
    let set_identifier = set.set_identifier().unwrap_or_default().to_string();

    let weight = set
        .weight()
        .ok_or_else(|| {
            RoutingError::Lookup(format!("record {} has no weight", set_identifier))
        })
        .and_then(|weight| {
            u32::try_from(weight).map_err(|_| {
                RoutingError::Lookup(format!(
                    "record {} has out-of-range weight {}",
                    set_identifier, weight
                ))
            })
        })?;

    let target = match set.alias_target() {
        Some(alias) => RouteTarget::Alias {
            dns_name: alias.dns_name().to_string(),
            hosted_zone_id: alias.hosted_zone_id().to_string(),
            evaluate_target_health: alias.evaluate_target_health(),
        },
        None => RouteTarget::Records {
            values: set
                .resource_records()
                .iter()
                .map(|record| record.value().to_string())
                .collect(),
            ttl: set.ttl().unwrap_or_default(),
        },
    };

    Ok(RoutingRecord {
        name: set.name().to_string(),
        record_type: set.r#type().as_str().to_string(),
        set_identifier,
        weight,
        target,
        health_check_id: set.health_check_id().map(str::to_string),
    })
}

fn upsert_change(change: &WeightChange) -> Result<Change, RoutingError> {
    let record = &change.record;
    let invalid = |e: aws_sdk_route53::error::BuildError| RoutingError::Update(e.to_string());

    let mut set = ResourceRecordSet::builder()
        .name(&record.name)
        .r#type(RrType::from(record.record_type.as_str()))
        .set_identifier(&record.set_identifier)
        .weight(i64::from(change.new_weight))
        .set_health_check_id(record.health_check_id.clone());

    set = match &record.target {
        RouteTarget::Records { values, ttl } => {
            let records = values
                .iter()
                .map(|value| ResourceRecord::builder().value(value).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(invalid)?;
            set.ttl(*ttl).set_resource_records(Some(records))
        }
        RouteTarget::Alias {
            dns_name,
            hosted_zone_id,
            evaluate_target_health,
        } => set.alias_target(
            AliasTarget::builder()
                .dns_name(dns_name)
                .hosted_zone_id(hosted_zone_id)
                .evaluate_target_health(*evaluate_target_health)
                .build()
                .map_err(invalid)?,
        ),
    };

    Change::builder()
        .action(ChangeAction::Upsert)
        .resource_record_set(set.build().map_err(invalid)?)
        .build()
        .map_err(invalid)
}
