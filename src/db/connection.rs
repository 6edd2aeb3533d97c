use crate::config::Cluster;
use anyhow::{Context, Result, anyhow, bail};
use scylla::{Session, SessionBuilder};
use std::time::Duration;
use tracing::{debug, info};

/// Describe the cluster for display, masking any password
pub fn describe_cluster(cluster: &Cluster) -> String {
    let nodes = cluster.node_addresses().join(",");
    match (&cluster.username, &cluster.password) {
        (Some(user), Some(_)) => format!("{}:***@{}", user, nodes),
        (Some(user), None) => format!("{}@{}", user, nodes),
        _ => nodes,
    }
}

/// Cluster connection retry configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Maximum number of retries for cluster connections
    pub max_retries: u32,
    /// Delay between connection retries
    pub retry_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay: Duration::from_millis(200),
        }
    }
}

/// Connect to the cluster with retry logic and switch to `keyspace`
pub async fn connect_with_retry(cluster: &Cluster, keyspace: &str) -> Result<Session> {
    connect_with_retry_config(cluster, keyspace, &ConnectionConfig::default()).await
}

pub async fn connect_with_retry_config(
    cluster: &Cluster,
    keyspace: &str,
    config: &ConnectionConfig,
) -> Result<Session> {
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        let mut builder = SessionBuilder::new().known_nodes(cluster.node_addresses());
        if let (Some(user), Some(password)) = (&cluster.username, &cluster.password) {
            builder = builder.user(user, password);
        }

        match builder.build().await {
            Ok(session) => {
                if attempt > 0 {
                    info!(
                        "Connected to cluster (after {} retry{})",
                        attempt,
                        if attempt == 1 { "" } else { "ies" }
                    );
                } else {
                    debug!("Connected to cluster {}", describe_cluster(cluster));
                }
                use_keyspace(&session, keyspace).await?;
                return Ok(session);
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < config.max_retries {
                    if attempt == 0 {
                        info!("Cluster not ready, retrying...");
                    }
                    tokio::time::sleep(config.retry_delay).await;
                }
            }
        }
    }

    Err(anyhow!(
        "Failed to connect to cluster at {} after {} attempts: {}",
        describe_cluster(cluster),
        config.max_retries + 1,
        last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string())
    ))
}

async fn use_keyspace(session: &Session, keyspace: &str) -> Result<()> {
    let result = session
        .query(
            "SELECT keyspace_name FROM system_schema.keyspaces WHERE keyspace_name = ?",
            (keyspace,),
        )
        .await
        .context("Failed to look up keyspace")?;

    let exists = result.rows_typed::<(String,)>()?.next().is_some();
    if !exists {
        bail!("Keyspace: {} does not exist", keyspace);
    }

    session
        .use_keyspace(keyspace, false)
        .await
        .with_context(|| format!("Failed to use keyspace {}", keyspace))?;
    Ok(())
}
