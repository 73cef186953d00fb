// src/services/queue.rs
//! Bounded background queue for CV optimization jobs
//!
//! Submissions go through a fixed-capacity channel consumed by a small
//! worker pool, so a burst of requests degrades into queueing and then
//! explicit rejection instead of unbounded task spawning. Each job drives
//! one CV record through the pending -> processing -> completed/failed
//! lifecycle with single-statement status updates.

use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use crate::services::optimizer::{OptimizeRequest, Optimizer};

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Optimization queue is full")]
    Full,

    #[error("Optimization queue is shut down")]
    Closed,
}

/// One unit of background work: optimize the content for a stored CV record
#[derive(Debug)]
pub struct OptimizeJob {
    pub cv_id: String,
    pub request: OptimizeRequest,
}

pub struct OptimizeQueue {
    tx: mpsc::Sender<OptimizeJob>,
    in_flight: Arc<AtomicUsize>,
}

impl std::fmt::Debug for OptimizeQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizeQueue")
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish()
    }
}

impl OptimizeQueue {
    /// Spawn the worker pool and return the submission handle
    pub fn start(
        pool: SqlitePool,
        optimizer: Arc<Optimizer>,
        workers: usize,
        capacity: usize,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel::<OptimizeJob>(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let in_flight = Arc::new(AtomicUsize::new(0));

        for worker_id in 0..workers {
            let rx = Arc::clone(&rx);
            let pool = pool.clone();
            let optimizer = Arc::clone(&optimizer);
            let in_flight = Arc::clone(&in_flight);

            tokio::spawn(async move {
                loop {
                    let job = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };

                    let Some(job) = job else {
                        break;
                    };

                    in_flight.fetch_add(1, Ordering::Relaxed);
                    process_job(&pool, &optimizer, job).await;
                    in_flight.fetch_sub(1, Ordering::Relaxed);
                }

                info!(worker_id, "Optimization worker stopped");
            });
        }

        Arc::new(Self { tx, in_flight })
    }

    /// Enqueue a job without blocking; a full queue is the caller's signal
    /// to shed load
    pub fn submit(&self, job: OptimizeJob) -> Result<(), QueueError> {
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Optimization queue rejected a job at capacity");
                Err(QueueError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }

    /// Jobs currently being processed by workers
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }
}

async fn process_job(pool: &SqlitePool, optimizer: &Optimizer, job: OptimizeJob) {
    info!(cv_id = %job.cv_id, "Starting CV optimization");

    if let Err(e) = mark_processing(pool, &job.cv_id).await {
        error!(cv_id = %job.cv_id, error = %e, "Failed to mark CV as processing");
        return;
    }

    match optimizer.optimize(&job.request).await {
        Ok(optimized) => {
            if let Err(e) = mark_completed(pool, &job.cv_id, &optimized).await {
                error!(cv_id = %job.cv_id, error = %e, "Failed to store optimized CV");
            } else {
                info!(cv_id = %job.cv_id, "CV optimization completed");
            }
        }
        Err(e) => {
            // The error text never includes the credential, only provider
            // and validation details
            warn!(cv_id = %job.cv_id, error = %e, "CV optimization failed");
            if let Err(db_err) = mark_failed(pool, &job.cv_id, &e.to_string()).await {
                error!(cv_id = %job.cv_id, error = %db_err, "Failed to record CV failure");
            }
        }
    }
}

async fn mark_processing(pool: &SqlitePool, cv_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE cvs SET status = 'processing', updated_at = datetime('now') WHERE id = ?")
        .bind(cv_id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn mark_completed(
    pool: &SqlitePool,
    cv_id: &str,
    optimized: &Value,
) -> Result<(), sqlx::Error> {
    let payload = optimized.to_string();
    sqlx::query(
        "UPDATE cvs SET status = 'completed', cv_optimized = ?, error_message = NULL, \
         updated_at = datetime('now') WHERE id = ?",
    )
    .bind(payload)
    .bind(cv_id)
    .execute(pool)
    .await?;
    Ok(())
}

async fn mark_failed(pool: &SqlitePool, cv_id: &str, message: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE cvs SET status = 'failed', error_message = ?, cv_optimized = NULL, \
         updated_at = datetime('now') WHERE id = ?",
    )
    .bind(message)
    .bind(cv_id)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::migrations;
    use crate::services::llm::LlmService;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::time::Duration;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        migrations::run_migrations(&pool).await.expect("migrations");
        pool
    }

    async fn insert_cv(pool: &SqlitePool, cv_id: &str) {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, datetime('now'))",
        )
        .bind("U_QUEUE1")
        .bind("queue@example.com")
        .bind("hash")
        .execute(pool)
        .await
        .expect("insert user");

        sqlx::query(
            "INSERT INTO cvs (id, user_id, description, job_description, model, provider, \
             status, created_at, updated_at) \
             VALUES (?, 'U_QUEUE1', 'Backend role', 'A senior backend position', \
             'test-model', 'groq', 'pending', datetime('now'), datetime('now'))",
        )
        .bind(cv_id)
        .execute(pool)
        .await
        .expect("insert cv");
    }

    /// Serve a Groq-shaped completion endpoint returning a fixed content
    /// payload, bound to an ephemeral local port
    async fn mock_groq_server(content: Value) -> String {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": content.to_string()
                }
            }]
        });

        let app = Router::new().route(
            "/openai/v1/chat/completions",
            post(move || {
                let body = body.clone();
                async move { Json(body) }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });

        format!("http://{}", addr)
    }

    fn base_cv(experience_count: usize) -> Value {
        let experiences: Vec<Value> = (0..experience_count)
            .map(|i| {
                json!({
                    "job_title": format!("Engineer {}", i),
                    "company": "Acme",
                    "location": "Remote",
                    "start_date": "2020",
                    "end_date": "2023",
                    "stack": "Rust",
                    "achievements": ["Shipped things"]
                })
            })
            .collect();

        json!({
            "professional_summary": "A developer",
            "core_competencies": {"technical_skills": ["Rust"]},
            "professional_experience": experiences,
            "education": [{
                "degree": "BSc",
                "institution": "UCL",
                "location": "London",
                "graduation_year": "2015"
            }],
            "courses": [],
            "key_projects": [],
            "languages": []
        })
    }

    async fn wait_for_terminal_status(pool: &SqlitePool, cv_id: &str) -> (String, Option<String>) {
        for _ in 0..100 {
            let (status, error_message): (String, Option<String>) =
                sqlx::query_as("SELECT status, error_message FROM cvs WHERE id = ?")
                    .bind(cv_id)
                    .fetch_one(pool)
                    .await
                    .expect("fetch status");

            if status == "completed" || status == "failed" {
                return (status, error_message);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("CV never reached a terminal status");
    }

    #[tokio::test]
    async fn test_job_completes_and_sanitizes_output() {
        let pool = test_pool().await;
        insert_cv(&pool, "CV_OK0001").await;

        let mut generated = base_cv(1);
        generated["professional_summary"] = json!("An **Expert** developer.");
        let base_url = mock_groq_server(generated).await;

        let llm = LlmService::with_base_urls(base_url.clone(), base_url);
        let optimizer = Arc::new(Optimizer::new(llm));
        let queue = OptimizeQueue::start(pool.clone(), optimizer, 1, 4);

        queue
            .submit(OptimizeJob {
                cv_id: "CV_OK0001".to_string(),
                request: OptimizeRequest {
                    job_description: "A senior backend position".to_string(),
                    cv_content: base_cv(1),
                    provider: "groq".to_string(),
                    model: "test-model".to_string(),
                    api_key: "gsk-test".to_string(),
                },
            })
            .expect("submit job");

        let (status, error_message) = wait_for_terminal_status(&pool, "CV_OK0001").await;
        assert_eq!(status, "completed");
        assert!(error_message.is_none());

        let (stored,): (String,) =
            sqlx::query_as("SELECT cv_optimized FROM cvs WHERE id = 'CV_OK0001'")
                .fetch_one(&pool)
                .await
                .expect("fetch optimized");
        let optimized: Value = serde_json::from_str(&stored).expect("stored JSON");
        assert_eq!(optimized["professional_summary"], "An Expert developer");
    }

    #[tokio::test]
    async fn test_job_fails_on_dropped_experience() {
        let pool = test_pool().await;
        insert_cv(&pool, "CV_FAIL01").await;

        // Model returns 2 entries where the original had 3
        let base_url = mock_groq_server(base_cv(2)).await;

        let llm = LlmService::with_base_urls(base_url.clone(), base_url);
        let optimizer = Arc::new(Optimizer::new(llm));
        let queue = OptimizeQueue::start(pool.clone(), optimizer, 1, 4);

        queue
            .submit(OptimizeJob {
                cv_id: "CV_FAIL01".to_string(),
                request: OptimizeRequest {
                    job_description: "A senior backend position".to_string(),
                    cv_content: base_cv(3),
                    provider: "groq".to_string(),
                    model: "test-model".to_string(),
                    api_key: "gsk-test".to_string(),
                },
            })
            .expect("submit job");

        let (status, error_message) = wait_for_terminal_status(&pool, "CV_FAIL01").await;
        assert_eq!(status, "failed");
        let message = error_message.expect("failure message");
        assert!(message.contains("work experience"));
        // The credential never reaches the persisted error
        assert!(!message.contains("gsk-test"));
    }

    #[tokio::test]
    async fn test_full_queue_rejects_submissions() {
        let pool = test_pool().await;
        let llm = LlmService::with_base_urls(
            "http://127.0.0.1:1".to_string(),
            "http://127.0.0.1:1".to_string(),
        );
        let optimizer = Arc::new(Optimizer::new(llm));

        // No workers: submissions stay queued until capacity runs out
        let queue = OptimizeQueue::start(pool, optimizer, 0, 1);

        let job = |id: &str| OptimizeJob {
            cv_id: id.to_string(),
            request: OptimizeRequest {
                job_description: "jd".to_string(),
                cv_content: json!({}),
                provider: "groq".to_string(),
                model: "m".to_string(),
                api_key: "k".to_string(),
            },
        };

        assert!(queue.submit(job("CV_A")).is_ok());
        assert!(matches!(queue.submit(job("CV_B")), Err(QueueError::Full)));
        assert_eq!(queue.in_flight(), 0);
    }
}
