use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::Config;
use crate::icon_disk_cache::{encode_png, IconDiskCache};
use crate::icon_key::{build_cache_key, IconRequest};
use crate::icon_memory_cache::MemoryIconCache;
use crate::icon_resolver::IconResolver;
use crate::logging;
use crate::model::{IconArtifact, IconMode, IconOrigin};

/// Answers whether the destination that asked for an icon still wants it.
/// Checked right before every delivery, never earlier.
pub type ValidityCheck = Box<dyn Fn() -> bool + Send>;
/// Hands the finished artifact back to the requesting destination.
pub type Delivery = Box<dyn FnOnce(IconArtifact) + Send>;

struct ResolveJob {
    request: IconRequest,
    cache_key: String,
    still_valid: ValidityCheck,
    deliver: Delivery,
}

struct Completion {
    request: IconRequest,
    artifact: IconArtifact,
    fallback_applied: bool,
    still_valid: ValidityCheck,
    deliver: Delivery,
}

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub memory_capacity: usize,
    pub icon_cache_dir: PathBuf,
    pub worker_count: usize,
    pub disk_budget_bytes: u64,
}

impl CoordinatorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            memory_capacity: config.memory_cache_capacity,
            icon_cache_dir: config.icon_cache_dir.clone(),
            worker_count: config.resolver_workers.max(1),
            disk_budget_bytes: config.disk_cache_budget_bytes,
        }
    }
}

/// Front door of the icon engine. Memory hits deliver on the caller's
/// context; everything else runs on a small worker pool and is handed back
/// through `pump_deliveries`, again on the caller's context. Destinations
/// therefore never see an artifact from a foreign thread.
pub struct IconLoadCoordinator {
    memory: Arc<MemoryIconCache>,
    disk: Arc<IconDiskCache>,
    job_tx: Option<Sender<ResolveJob>>,
    done_rx: Mutex<Receiver<Completion>>,
    failure_listener: Mutex<Option<Box<dyn Fn(&IconRequest) + Send>>>,
    workers: Vec<JoinHandle<()>>,
}

impl IconLoadCoordinator {
    pub fn new(resolver: Arc<IconResolver>, settings: CoordinatorSettings) -> Self {
        let memory = Arc::new(MemoryIconCache::new(settings.memory_capacity));
        let disk = Arc::new(IconDiskCache::new(settings.icon_cache_dir));
        disk.enforce_budget(settings.disk_budget_bytes);

        let (job_tx, job_rx) = mpsc::channel::<ResolveJob>();
        let (done_tx, done_rx) = mpsc::channel::<Completion>();
        let shared_jobs = Arc::new(Mutex::new(job_rx));

        let worker_count = settings.worker_count.max(1);
        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let jobs = Arc::clone(&shared_jobs);
            let done = done_tx.clone();
            let memory = Arc::clone(&memory);
            let disk = Arc::clone(&disk);
            let resolver = Arc::clone(&resolver);
            let handle = thread::Builder::new()
                .name(format!("icon-resolve-{index}"))
                .spawn(move || worker_loop(jobs, done, memory, disk, resolver));
            match handle {
                Ok(handle) => workers.push(handle),
                Err(error) => logging::error(&format!("failed to spawn icon worker: {error}")),
            }
        }

        Self {
            memory,
            disk,
            job_tx: Some(job_tx),
            done_rx: Mutex::new(done_rx),
            failure_listener: Mutex::new(None),
            workers,
        }
    }

    /// Requests an icon. A memory hit is delivered before this returns,
    /// still gated by `still_valid`; anything slower is queued and comes
    /// back through `pump_deliveries`.
    pub fn load(&self, request: IconRequest, still_valid: ValidityCheck, deliver: Delivery) {
        let cache_key = build_cache_key(&request);

        if !request.force_refresh {
            if let Some(artifact) = self.memory.get(&cache_key) {
                if still_valid() {
                    deliver(artifact);
                }
                return;
            }
        }

        let job = ResolveJob {
            request,
            cache_key,
            still_valid,
            deliver,
        };
        let sent = self
            .job_tx
            .as_ref()
            .is_some_and(|tx| tx.send(job).is_ok());
        if !sent {
            logging::warn("icon resolve queue is closed; request dropped");
        }
    }

    /// Drains finished resolutions and delivers each one whose destination
    /// is still valid. Fallback completions also notify the failure
    /// listener. Returns the number of artifacts delivered.
    pub fn pump_deliveries(&self) -> usize {
        let Ok(done_rx) = self.done_rx.lock() else {
            return 0;
        };

        let mut delivered = 0;
        while let Ok(done) = done_rx.try_recv() {
            if done.fallback_applied {
                if let Ok(listener) = self.failure_listener.lock() {
                    if let Some(listener) = listener.as_ref() {
                        listener(&done.request);
                    }
                }
            }
            if (done.still_valid)() {
                (done.deliver)(done.artifact);
                delivered += 1;
            }
        }
        delivered
    }

    /// Installs the single listener told about resolutions that ended in a
    /// fallback badge. Replaces any previous listener.
    pub fn set_failure_listener(&self, listener: impl Fn(&IconRequest) + Send + 'static) {
        if let Ok(mut slot) = self.failure_listener.lock() {
            *slot = Some(Box::new(listener));
        }
    }

    /// Synchronous load for contexts with no delivery loop of their own.
    /// Pumps on behalf of the caller until the artifact lands.
    pub fn load_blocking(&self, request: IconRequest) -> Option<IconArtifact> {
        let (result_tx, result_rx) = mpsc::channel();
        self.load(
            request,
            Box::new(|| true),
            Box::new(move |artifact| {
                let _ = result_tx.send(artifact);
            }),
        );

        loop {
            self.pump_deliveries();
            match result_rx.try_recv() {
                Ok(artifact) => return Some(artifact),
                Err(TryRecvError::Empty) => thread::sleep(Duration::from_millis(5)),
                Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    pub fn memory_entry_count(&self) -> usize {
        self.memory.len()
    }

    pub fn disk_cache(&self) -> &IconDiskCache {
        &self.disk
    }
}

impl Drop for IconLoadCoordinator {
    fn drop(&mut self) {
        // Closing the job channel lets every worker finish its recv loop.
        self.job_tx.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                logging::warn("icon resolve worker exited with a panic");
            }
        }
    }
}

fn worker_loop(
    jobs: Arc<Mutex<Receiver<ResolveJob>>>,
    done: Sender<Completion>,
    memory: Arc<MemoryIconCache>,
    disk: Arc<IconDiskCache>,
    resolver: Arc<IconResolver>,
) {
    loop {
        let job = {
            let Ok(job_rx) = jobs.lock() else {
                return;
            };
            job_rx.recv()
        };
        let Ok(job) = job else {
            return;
        };

        let (artifact, fallback_applied) = produce_artifact(&job, &memory, &disk, &resolver);
        let completion = Completion {
            request: job.request,
            artifact,
            fallback_applied,
            still_valid: job.still_valid,
            deliver: job.deliver,
        };
        if done.send(completion).is_err() {
            return;
        }
    }
}

fn produce_artifact(
    job: &ResolveJob,
    memory: &MemoryIconCache,
    disk: &IconDiskCache,
    resolver: &IconResolver,
) -> (IconArtifact, bool) {
    let request = &job.request;

    if request.icon_mode == IconMode::Resolved && !request.force_refresh {
        if let Some(image) = disk
            .load(&job.cache_key)
            .and_then(|bytes| image::load_from_memory(&bytes).ok())
            .map(|decoded| decoded.to_rgba8())
        {
            let artifact = IconArtifact {
                image,
                origin: IconOrigin::Cached,
            };
            memory.put(job.cache_key.clone(), artifact.clone());
            return (artifact, false);
        }
    }

    let (artifact, genuine) = resolver.resolve(request);
    memory.put(job.cache_key.clone(), artifact.clone());

    if genuine && request.icon_mode == IconMode::Resolved {
        if let Some(bytes) = encode_png(&artifact.image) {
            disk.store(&job.cache_key, &bytes);
        }
    }

    let fallback_applied = artifact.origin == IconOrigin::FallbackDefault;
    (artifact, fallback_applied)
}
