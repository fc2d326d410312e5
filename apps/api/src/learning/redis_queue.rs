//! Redis-backed session queues.
//!
//! Keys per session:
//! - `learning:queue:{id}`    list of flashcard ids, head at index 0
//! - `learning:reviewed:{id}` reviewed counter; also marks the session as seeded
//!
//! Both keys carry the configured TTL, refreshed on every review.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, Script};
use tracing::info;
use uuid::Uuid;

use crate::learning::queue::{Advance, QueueError, SessionQueueStore};

/// Pops the head only if it equals ARGV[1]. Returns 1 on success, 0 otherwise.
/// ARGV[2] = "1" also bumps the reviewed counter; ARGV[3] is the TTL in seconds.
const POP_HEAD_SCRIPT: &str = r#"
local head = redis.call('LINDEX', KEYS[1], 0)
if head ~= ARGV[1] then
    return 0
end
redis.call('LPOP', KEYS[1])
if ARGV[2] == '1' then
    redis.call('INCR', KEYS[2])
end
redis.call('EXPIRE', KEYS[1], ARGV[3])
redis.call('EXPIRE', KEYS[2], ARGV[3])
return 1
"#;

impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        QueueError::Backend(err.to_string())
    }
}

pub struct RedisQueueStore {
    connection: MultiplexedConnection,
    ttl_secs: u64,
    pop_head: Script,
}

impl RedisQueueStore {
    pub async fn connect(client: &Client, ttl_secs: u64) -> Result<Self, QueueError> {
        let connection = client.get_multiplexed_tokio_connection().await?;
        info!("Redis session queue store connected (ttl {ttl_secs}s)");
        Ok(Self {
            connection,
            ttl_secs,
            pop_head: Script::new(POP_HEAD_SCRIPT),
        })
    }
}

fn queue_key(session_id: Uuid) -> String {
    format!("learning:queue:{session_id}")
}

fn reviewed_key(session_id: Uuid) -> String {
    format!("learning:reviewed:{session_id}")
}

fn parse_id(raw: &str) -> Result<Uuid, QueueError> {
    Uuid::parse_str(raw)
        .map_err(|e| QueueError::Backend(format!("Corrupt flashcard id '{raw}' in queue: {e}")))
}

#[async_trait]
impl SessionQueueStore for RedisQueueStore {
    async fn seed(&self, session_id: Uuid, card_ids: &[Uuid]) -> Result<(), QueueError> {
        let mut con = self.connection.clone();

        // SET NX on the counter doubles as the "already seeded" guard.
        let created: Option<String> = redis::cmd("SET")
            .arg(reviewed_key(session_id))
            .arg(0)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut con)
            .await?;
        if created.is_none() {
            return Err(QueueError::DuplicateSession(session_id));
        }

        if card_ids.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = card_ids.iter().map(Uuid::to_string).collect();
        redis::pipe()
            .atomic()
            .cmd("RPUSH")
            .arg(queue_key(session_id))
            .arg(ids)
            .ignore()
            .cmd("EXPIRE")
            .arg(queue_key(session_id))
            .arg(self.ttl_secs)
            .ignore()
            .query_async::<_, ()>(&mut con)
            .await?;
        Ok(())
    }

    async fn head(&self, session_id: Uuid) -> Result<Option<Uuid>, QueueError> {
        let mut con = self.connection.clone();
        let head: Option<String> = redis::cmd("LINDEX")
            .arg(queue_key(session_id))
            .arg(0)
            .query_async(&mut con)
            .await?;
        head.as_deref().map(parse_id).transpose()
    }

    async fn remaining(&self, session_id: Uuid) -> Result<u32, QueueError> {
        let mut con = self.connection.clone();
        let len: u32 = redis::cmd("LLEN")
            .arg(queue_key(session_id))
            .query_async(&mut con)
            .await?;
        Ok(len)
    }

    async fn reviewed(&self, session_id: Uuid) -> Result<u32, QueueError> {
        let mut con = self.connection.clone();
        let count: Option<u32> = redis::cmd("GET")
            .arg(reviewed_key(session_id))
            .query_async(&mut con)
            .await?;
        Ok(count.unwrap_or(0))
    }

    async fn pop_head(
        &self,
        session_id: Uuid,
        card_id: Uuid,
        advance: Advance,
    ) -> Result<(), QueueError> {
        let mut con = self.connection.clone();
        let bump = if advance == Advance::Reviewed { "1" } else { "0" };
        let popped: i64 = self
            .pop_head
            .key(queue_key(session_id))
            .key(reviewed_key(session_id))
            .arg(card_id.to_string())
            .arg(bump)
            .arg(self.ttl_secs)
            .invoke_async(&mut con)
            .await?;

        if popped == 1 {
            Ok(())
        } else {
            Err(QueueError::NotQueueHead {
                session_id,
                card_id,
            })
        }
    }

    async fn dispose(&self, session_id: Uuid) -> Result<(), QueueError> {
        let mut con = self.connection.clone();
        redis::cmd("DEL")
            .arg(queue_key(session_id))
            .arg(reviewed_key(session_id))
            .query_async::<_, ()>(&mut con)
            .await?;
        Ok(())
    }
}
