//! Redis-backed job registry.
//!
//! Layout:
//! - `h3:job:{id}`: job JSON, with a TTL once terminal
//! - `h3:jobs:ready`: sorted set of claimable ids, scored by priority then age
//! - `h3:jobs:delayed`: sorted set of ids waiting out a retry backoff, scored by ready-at ms
//! - `h3:jobs:index`: set of every id still tracked, for stats
//!
//! `ZPOPMIN` on the ready set hands each job to exactly one worker.

use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, Script};
use tracing::{debug, info, warn};

use h3_models::{Job, JobId, JobStatus, TransitionError};

use crate::config::RegistryConfig;
use crate::error::{QueueError, QueueResult};
use crate::registry::{ensure_monotonic, JobRegistry, QueueStats};

const JOB_KEY_PREFIX: &str = "h3:job:";
const READY_KEY: &str = "h3:jobs:ready";
const DELAYED_KEY: &str = "h3:jobs:delayed";
const INDEX_KEY: &str = "h3:jobs:index";

/// Max delayed jobs moved to the ready set per claim.
const PROMOTE_BATCH: isize = 100;

/// Move one id from the delayed set to the ready set in a single step.
const PROMOTE_SCRIPT: &str = r#"
if redis.call('ZREM', KEYS[1], ARGV[1]) == 1 then
    redis.call('ZADD', KEYS[2], ARGV[2], ARGV[1])
    return 1
end
return 0
"#;

pub struct RedisJobRegistry {
    client: redis::Client,
    config: RegistryConfig,
}

impl RedisJobRegistry {
    pub fn new(config: RegistryConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(RegistryConfig::from_env())
    }

    fn job_key(id: &JobId) -> String {
        format!("{}{}", JOB_KEY_PREFIX, id)
    }

    /// Lower scores are claimed first.
    fn ready_score(job: &Job) -> f64 {
        f64::from(job.priority.rank()) * 1e13 + job.created_at.timestamp_millis() as f64
    }

    async fn connection(&self) -> QueueResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::connection_failed(e.to_string()))
    }

    async fn load(
        conn: &mut redis::aio::MultiplexedConnection,
        id: &JobId,
    ) -> QueueResult<Option<Job>> {
        let raw: Option<String> = conn.get(Self::job_key(id)).await?;
        raw.map(|s| serde_json::from_str(&s).map_err(QueueError::from))
            .transpose()
    }

    /// Decode `MGET` results, skipping expired and corrupt records.
    fn decode_records(ids: &[String], raw: Vec<Option<String>>) -> Vec<Job> {
        ids.iter()
            .zip(raw)
            .filter_map(|(id, raw)| {
                serde_json::from_str(&raw?)
                    .map_err(|e| warn!(job_id = %id, error = %e, "Skipping undecodable job record"))
                    .ok()
            })
            .collect()
    }

    /// Write the record and place the id in the structure its status calls for.
    async fn store(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        job: &Job,
    ) -> QueueResult<()> {
        let key = Self::job_key(&job.id);
        let payload = serde_json::to_string(job)?;
        let id = job.id.as_str();

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.zrem(READY_KEY, id).ignore();
        pipe.zrem(DELAYED_KEY, id).ignore();

        match job.status {
            JobStatus::Queued => {
                pipe.set(&key, &payload).ignore();
                pipe.sadd(INDEX_KEY, id).ignore();
                if job.ready_at > Utc::now() {
                    pipe.zadd(DELAYED_KEY, id, job.ready_at.timestamp_millis() as f64)
                        .ignore();
                } else {
                    pipe.zadd(READY_KEY, id, Self::ready_score(job)).ignore();
                }
            }
            JobStatus::Processing => {
                pipe.set(&key, &payload).ignore();
                pipe.sadd(INDEX_KEY, id).ignore();
            }
            JobStatus::Completed | JobStatus::Failed => {
                let ttl = self.config.retention.as_secs().max(1);
                pipe.set_ex(&key, &payload, ttl).ignore();
            }
        }

        pipe.query_async::<()>(conn).await?;
        Ok(())
    }

    /// Move delayed jobs whose backoff has elapsed into the ready set.
    async fn promote_due(&self, conn: &mut redis::aio::MultiplexedConnection) -> QueueResult<()> {
        let now_ms = Utc::now().timestamp_millis();
        let due: Vec<String> = conn
            .zrangebyscore_limit(DELAYED_KEY, "-inf", now_ms, 0, PROMOTE_BATCH)
            .await?;

        for id in due {
            let job_id = JobId::from(id.clone());
            match Self::load(conn, &job_id).await? {
                Some(job) => {
                    // Only the caller whose ZREM succeeds adds it to the ready set.
                    let moved: i64 = Script::new(PROMOTE_SCRIPT)
                        .key(DELAYED_KEY)
                        .key(READY_KEY)
                        .arg(&id)
                        .arg(Self::ready_score(&job))
                        .invoke_async(conn)
                        .await?;
                    if moved == 1 {
                        debug!(job_id = %job_id, "Promoted delayed job");
                    }
                }
                None => {
                    redis::pipe()
                        .atomic()
                        .zrem(DELAYED_KEY, &id)
                        .ignore()
                        .srem(INDEX_KEY, &id)
                        .ignore()
                        .query_async::<()>(conn)
                        .await?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl JobRegistry for RedisJobRegistry {
    async fn insert(&self, job: &Job) -> QueueResult<()> {
        let mut conn = self.connection().await?;
        self.store(&mut conn, job).await
    }

    async fn get(&self, id: &JobId) -> QueueResult<Option<Job>> {
        let mut conn = self.connection().await?;
        Self::load(&mut conn, id).await
    }

    async fn save(&self, job: &Job) -> QueueResult<()> {
        let mut conn = self.connection().await?;
        let stored = Self::load(&mut conn, &job.id)
            .await?
            .ok_or_else(|| QueueError::JobNotFound(job.id.clone()))?;
        ensure_monotonic(&stored, job)?;
        self.store(&mut conn, job).await
    }

    async fn claim_next(&self) -> QueueResult<Option<Job>> {
        let mut conn = self.connection().await?;
        self.promote_due(&mut conn).await?;

        loop {
            let popped: Vec<(String, f64)> = conn.zpopmin(READY_KEY, 1).await?;
            let Some((id, _)) = popped.into_iter().next() else {
                return Ok(None);
            };
            let job_id = JobId::from(id);

            let Some(mut job) = Self::load(&mut conn, &job_id).await? else {
                warn!(job_id = %job_id, "Ready entry without a job record");
                continue;
            };
            if job.status != JobStatus::Queued {
                continue;
            }

            match job.start() {
                Ok(()) => {
                    self.store(&mut conn, &job).await?;
                    debug!(job_id = %job_id, attempt = job.attempts, "Claimed job");
                    return Ok(Some(job));
                }
                Err(TransitionError::AttemptsExhausted { max_attempts }) => {
                    warn!(job_id = %job_id, max_attempts, "Queued job has no attempts left");
                    job.fail("Maximum attempts exhausted")?;
                    self.store(&mut conn, &job).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn stats(&self) -> QueueResult<QueueStats> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = conn.smembers(INDEX_KEY).await?;
        if ids.is_empty() {
            return Ok(QueueStats::default());
        }

        let keys: Vec<String> = ids
            .iter()
            .map(|id| format!("{}{}", JOB_KEY_PREFIX, id))
            .collect();
        let raw: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(&mut conn).await?;

        Ok(QueueStats::tally(&Self::decode_records(&ids, raw)))
    }

    async fn purge_expired(&self) -> QueueResult<usize> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = conn.smembers(INDEX_KEY).await?;

        let mut purged = 0;
        for id in ids {
            let exists: bool = conn.exists(format!("{}{}", JOB_KEY_PREFIX, id)).await?;
            if !exists {
                conn.srem::<_, _, ()>(INDEX_KEY, &id).await?;
                purged += 1;
            }
        }

        if purged > 0 {
            info!("Purged {} expired job index entries", purged);
        }
        Ok(purged)
    }

    async fn ping(&self) -> QueueResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use h3_models::{JobPriority, JobType};
    use serde_json::json;

    #[test]
    fn test_ready_score_orders_priority_before_age() {
        let old_low = Job::new(JobType::ContentProcessing, json!({})).with_priority(JobPriority::Low);
        let mut new_critical =
            Job::new(JobType::ContentProcessing, json!({})).with_priority(JobPriority::Critical);
        new_critical.created_at = old_low.created_at + chrono::Duration::days(365);

        assert!(RedisJobRegistry::ready_score(&new_critical) < RedisJobRegistry::ready_score(&old_low));

        let mut newer_low = old_low.clone();
        newer_low.created_at = old_low.created_at + chrono::Duration::milliseconds(1);
        assert!(RedisJobRegistry::ready_score(&old_low) < RedisJobRegistry::ready_score(&newer_low));
    }

    #[test]
    fn test_decode_records_skips_corrupt_and_missing() {
        let job = Job::new(JobType::ContentProcessing, json!({}));
        let ids = vec![job.id.to_string(), "job_gone".into(), "job_bad".into()];
        let raw = vec![
            Some(serde_json::to_string(&job).unwrap()),
            None,
            Some("{not json".into()),
        ];

        let jobs = RedisJobRegistry::decode_records(&ids, raw);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, job.id);
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_redis_delayed_job_is_promoted_once_due() {
        let registry = RedisJobRegistry::from_env().unwrap();
        let mut job = Job::new(JobType::ContentProcessing, json!({})).with_priority(JobPriority::Critical);
        job.ready_at = Utc::now() + chrono::Duration::milliseconds(200);
        registry.insert(&job).await.unwrap();

        let mut conn = registry.connection().await.unwrap();
        let delayed: Option<f64> = conn.zscore(DELAYED_KEY, job.id.as_str()).await.unwrap();
        assert!(delayed.is_some());

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        registry.promote_due(&mut conn).await.unwrap();

        let delayed: Option<f64> = conn.zscore(DELAYED_KEY, job.id.as_str()).await.unwrap();
        let ready: Option<f64> = conn.zscore(READY_KEY, job.id.as_str()).await.unwrap();
        assert!(delayed.is_none());
        assert_eq!(ready, Some(RedisJobRegistry::ready_score(&job)));
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_redis_lifecycle() {
        let registry = RedisJobRegistry::from_env().unwrap();
        registry.ping().await.unwrap();

        let job = Job::new(JobType::ContentProcessing, json!({})).with_priority(JobPriority::Critical);
        registry.insert(&job).await.unwrap();
        assert_eq!(registry.get(&job.id).await.unwrap().unwrap().status, JobStatus::Queued);

        let mut claimed = registry.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.id, job.id);
        assert_eq!(claimed.status, JobStatus::Processing);

        claimed.complete().unwrap();
        registry.save(&claimed).await.unwrap();
        let stored = registry.get(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.progress(), 100);

        let mut reverted = stored.clone();
        reverted.status = JobStatus::Queued;
        assert!(registry.save(&reverted).await.is_err());
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_redis_unknown_job() {
        let registry = RedisJobRegistry::from_env().unwrap();
        assert!(registry.get(&JobId::from("job_42")).await.unwrap().is_none());
    }
}
