//! Runs tag-service calls off the UI thread.
//!
//! The UI loop submits [`Job`]s and drains [`Outcome`]s every frame; a single
//! worker thread executes them in order against the [`TagSource`].

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tagboard_core::error::ApiError;
use tagboard_core::model::{CreateTagRequest, Tag, TagResponse};
use tagboard_core::query::{FetchId, FetchRequest};
use tagboard_core::source::TagSource;
use tracing::{debug, warn};

#[derive(Debug)]
pub enum Job {
    Fetch(FetchRequest),
    Create(CreateTagRequest),
}

#[derive(Debug)]
pub enum Outcome {
    Fetched {
        id: FetchId,
        result: Result<TagResponse, ApiError>,
    },
    Created(Result<Tag, ApiError>),
}

pub struct Dispatcher {
    jobs: Sender<Job>,
    outcomes: Receiver<Outcome>,
}

impl Dispatcher {
    /// Start the worker. It exits once the dispatcher is dropped and its
    /// current job has finished.
    pub fn spawn(source: Arc<dyn TagSource>) -> std::io::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (out_tx, out_rx) = mpsc::channel::<Outcome>();
        thread::Builder::new()
            .name("tb-fetch".to_string())
            .spawn(move || worker(source.as_ref(), &job_rx, &out_tx))?;
        Ok(Self {
            jobs: job_tx,
            outcomes: out_rx,
        })
    }

    /// Queue a job. Returns `false` if the worker has gone away.
    pub fn submit(&self, job: Job) -> bool {
        self.jobs.send(job).is_ok()
    }

    /// Everything finished since the last call, without blocking.
    pub fn drain(&self) -> Vec<Outcome> {
        self.outcomes.try_iter().collect()
    }
}

fn worker(source: &dyn TagSource, jobs: &Receiver<Job>, outcomes: &Sender<Outcome>) {
    for job in jobs {
        let outcome = match job {
            Job::Fetch(request) => {
                debug!(key = %request.key, "worker: fetching page");
                Outcome::Fetched {
                    id: request.id,
                    result: source.fetch_page(&request.key, request.page_size),
                }
            }
            Job::Create(request) => {
                debug!(title = %request.title, "worker: creating tag");
                Outcome::Created(source.create_tag(&request))
            }
        };
        if outcomes.send(outcome).is_err() {
            warn!("worker: UI gone, stopping");
            break;
        }
    }
}
