//! Asynchronous execution of algorithms on a tokio worker pool.

use crate::algorithm::AlgorithmInstance;
use crate::error::{FrameworkError, FrameworkResult};
use std::future::Future;
use tokio::runtime::{Handle, Runtime as TokioRuntime};
use tokio::task::JoinHandle;
use tracing::debug;

/// Configuration for the executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Number of worker threads.
    pub worker_count: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
        }
    }
}

/// Outcome of an asynchronous run: the instance comes back to its owner
/// together with the result of `execute()`.
pub type Completion = (AlgorithmInstance, FrameworkResult<()>);

/// Runs `execute()` off the calling thread.
///
/// Each execution occupies one blocking worker until it returns.
/// Notifications are posted from that worker.
pub struct AsyncExecutor {
    config: RuntimeConfig,
    runtime: TokioRuntime,
}

impl AsyncExecutor {
    pub fn new(config: RuntimeConfig) -> FrameworkResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_count.max(1))
            .max_blocking_threads(config.worker_count.max(1))
            .thread_name("reductionrs-worker")
            .enable_all()
            .build()?;

        debug!(workers = config.worker_count, "executor started");
        Ok(Self { config, runtime })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    /// Execute `instance` on a worker. Await or [`wait`](Self::wait) the
    /// handle to get the instance back.
    pub fn execute_async(&self, mut instance: AlgorithmInstance) -> JoinHandle<Completion> {
        self.runtime.spawn_blocking(move || {
            let result = instance.execute();
            (instance, result)
        })
    }

    /// Execute `instance` on a worker and pass the outcome to
    /// `on_complete` there.
    ///
    /// `on_complete` always runs; a panic inside the algorithm arrives as
    /// an `Execution` error.
    pub fn execute_with_callback<F>(&self, mut instance: AlgorithmInstance, on_complete: F)
    where
        F: FnOnce(AlgorithmInstance, FrameworkResult<()>) + Send + 'static,
    {
        self.runtime.spawn_blocking(move || {
            let result = instance.execute_catching_panics();
            on_complete(instance, result);
        });
    }

    /// Block until a spawned execution completes.
    ///
    /// A panic inside the algorithm surfaces as a `Runtime` error.
    pub fn wait(&self, handle: JoinHandle<Completion>) -> FrameworkResult<Completion> {
        self.runtime
            .block_on(handle)
            .map_err(|e| FrameworkError::Runtime(std::io::Error::other(e)))
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{Algorithm, ExecutionContext};
    use crate::property::{Property, PropertyManager};
    use std::sync::mpsc;
    use std::time::Duration;

    #[derive(Default)]
    struct Sum;

    impl Algorithm for Sum {
        fn name(&self) -> &'static str {
            "Sum"
        }

        fn declare_properties(&mut self, pm: &mut PropertyManager) -> FrameworkResult<()> {
            pm.declare(Property::new("Values", Vec::<i64>::new()))?;
            pm.declare(Property::new("Total", 0i64).with_direction(crate::property::Direction::Output))
        }

        fn run(&mut self, ctx: &mut ExecutionContext<'_>) -> anyhow::Result<()> {
            let values: Vec<i64> = ctx.get("Values")?;
            if values.contains(&-1) {
                panic!("negative sentinel");
            }
            ctx.set("Total", values.iter().sum::<i64>())?;
            Ok(())
        }
    }

    fn sum(values: Vec<i64>) -> AlgorithmInstance {
        let mut alg = AlgorithmInstance::from_algorithm(Sum);
        alg.initialize().unwrap();
        alg.set_property("Values", values).unwrap();
        alg
    }

    fn executor() -> AsyncExecutor {
        AsyncExecutor::new(RuntimeConfig { worker_count: 2 }).unwrap()
    }

    #[test]
    fn test_default_config_uses_cpu_count() {
        assert_eq!(RuntimeConfig::default().worker_count, num_cpus::get());
    }

    #[test]
    fn test_execute_async_returns_instance() {
        let executor = executor();
        let handle = executor.execute_async(sum(vec![1, 2, 3]));
        let (alg, result) = executor.wait(handle).unwrap();

        result.unwrap();
        assert_eq!(alg.get_value::<i64>("Total").unwrap(), 6);
    }

    #[test]
    fn test_callback_runs_on_completion() {
        let executor = executor();
        let (tx, rx) = mpsc::channel();
        for n in 0..4 {
            let tx = tx.clone();
            executor.execute_with_callback(sum(vec![n, n]), move |alg, result| {
                tx.send((alg.get_value::<i64>("Total").unwrap(), result.is_ok())).unwrap();
            });
        }
        drop(tx);

        let mut totals: Vec<i64> = rx
            .iter()
            .map(|(t, ok)| {
                assert!(ok);
                t
            })
            .collect();
        totals.sort();
        assert_eq!(totals, vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_panicking_algorithm_is_runtime_error() {
        let executor = executor();
        let handle = executor.execute_async(sum(vec![-1]));
        assert!(matches!(executor.wait(handle), Err(FrameworkError::Runtime(_))));
    }

    #[test]
    fn test_callback_runs_when_algorithm_panics() {
        let executor = executor();
        let (tx, rx) = mpsc::channel();
        executor.execute_with_callback(sum(vec![-1]), move |alg, result| {
            tx.send((alg.state(), result)).unwrap();
        });

        let (state, result) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(state, crate::algorithm::ExecutionState::Failed);
        let err = result.unwrap_err();
        assert!(matches!(err, FrameworkError::Execution { ref algorithm, .. } if algorithm == "Sum"));
        assert!(err.to_string().contains("negative sentinel"));
    }
}
