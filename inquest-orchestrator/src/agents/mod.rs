//! Research agent pool
//!
//! A fixed set of agent workers shared by the fan-out tasks. The pool
//! size is independent of how many sub-queries a run produces; tasks
//! are assigned round-robin and each worker answers one prompt at a
//! time, so a burst of tasks queues on its assigned worker rather than
//! flooding the provider.

pub mod prompts;

use inquest_core::error::InquestResult;
use inquest_core::traits::Agent;
use inquest_core::types::AgentResponse;
use std::sync::Arc;
use tokio::sync::Mutex;

struct Worker {
    agent: Arc<dyn Agent>,
    gate: Mutex<()>,
}

pub struct AgentPool {
    workers: Vec<Worker>,
}

impl AgentPool {
    pub fn new(agents: Vec<Arc<dyn Agent>>) -> InquestResult<Self> {
        if agents.is_empty() {
            return Err(inquest_core::config_error!(
                "agent pool requires at least one worker",
                "agent_pool"
            ));
        }
        Ok(Self {
            workers: agents
                .into_iter()
                .map(|agent| Worker {
                    agent,
                    gate: Mutex::new(()),
                })
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Ask the worker at `worker_index` (wrapped modulo the pool size).
    /// Concurrent callers on the same worker serialize on its gate.
    pub async fn ask(&self, worker_index: usize, prompt: &str) -> InquestResult<AgentResponse> {
        let worker = &self.workers[worker_index % self.workers.len()];
        let _permit = worker.gate.lock().await;
        worker.agent.ask(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAgent {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Agent for CountingAgent {
        async fn ask(&self, _prompt: &str) -> InquestResult<AgentResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AgentResponse::Text(format!("answer {}", n)))
        }
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(AgentPool::new(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn index_wraps_around_pool_size() {
        let agents: Vec<Arc<dyn Agent>> = (0..2)
            .map(|_| {
                Arc::new(CountingAgent {
                    calls: AtomicUsize::new(0),
                }) as Arc<dyn Agent>
            })
            .collect();
        let pool = AgentPool::new(agents).unwrap();
        assert_eq!(pool.len(), 2);

        // Index 5 lands on worker 1, index 4 on worker 0
        let a = pool.ask(5, "q").await.unwrap();
        let b = pool.ask(4, "q").await.unwrap();
        assert_eq!(a.text(), "answer 0");
        assert_eq!(b.text(), "answer 0");
    }
}
