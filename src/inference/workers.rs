//! Worker threads for CPU bound inference.
//!
//! Burn modules are `Send` but not `Sync`, so the loaded model is not shared
//! between threads. Each worker owns a read-only replica cloned from the model
//! host at startup and pulls jobs from a shared channel. Async callers await
//! the result through a oneshot reply, keeping decoding and the forward pass
//! off the Tokio executor threads.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use burn::tensor::backend::Backend;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::model::{ModelHost, PlantClassifier};
use crate::utils::error::{LeafLensError, Result};

type Job<B> = Box<dyn FnOnce(&PlantClassifier<B>, &<B as Backend>::Device) + Send + 'static>;

/// Fixed set of inference threads, each holding its own model replica
pub struct InferencePool<B: Backend> {
    tx: mpsc::Sender<Job<B>>,
    size: usize,
}

impl<B: Backend> InferencePool<B> {
    /// Start `size` workers with replicas of the host's model
    pub fn spawn(host: &ModelHost<B>, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(LeafLensError::Config(
                "inference pool needs at least one worker".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel::<Job<B>>();
        let shared_rx = Arc::new(Mutex::new(rx));

        for id in 0..size {
            let rx = shared_rx.clone();
            let model = host.model().clone();
            let device = host.device().clone();

            thread::Builder::new()
                .name(format!("inference-{}", id))
                .spawn(move || worker_loop(id, model, device, rx))?;
        }

        debug!("Started {} inference workers", size);
        Ok(Self { tx, size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `f` on one of the workers and await its result
    ///
    /// A panic inside `f` is reported as an inference failure and the worker
    /// keeps serving. If the caller stops waiting, the result is discarded.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&PlantClassifier<B>, &B::Device) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let job: Job<B> = Box::new(move |model, device| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(model, device)))
                .unwrap_or_else(|payload| {
                    let msg = panic_message(payload.as_ref());
                    error!("Inference job panicked: {}", msg);
                    Err(LeafLensError::Inference(msg))
                });
            let _ = reply_tx.send(outcome);
        });

        self.tx
            .send(job)
            .map_err(|_| LeafLensError::Inference("inference workers have shut down".to_string()))?;

        reply_rx
            .await
            .map_err(|_| LeafLensError::Inference("inference worker dropped the job".to_string()))?
    }
}

fn worker_loop<B: Backend>(
    id: usize,
    model: PlantClassifier<B>,
    device: B::Device,
    rx: Arc<Mutex<mpsc::Receiver<Job<B>>>>,
) {
    loop {
        let job = match rx.lock() {
            Ok(guard) => guard.recv(),
            Err(_) => break,
        };

        match job {
            Ok(job) => job(&model, &device),
            // Every sender is gone: the pool was dropped
            Err(_) => break,
        }
    }

    debug!("Inference worker {} stopped", id);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
