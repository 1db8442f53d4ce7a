//! Background network work for the UI thread.
//!
//! The frame loop owns all session state. Requests run on a small tokio
//! runtime and report back through a channel that the UI drains once per
//! frame. Nothing is cancelled; if two responses race, whichever the UI
//! drains last wins.

use std::future::Future;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::SurveyConfig;
use crate::data::model::{DetectionFeed, RawFileRecord};
use crate::error::SurveyError;
use crate::remote::feed::load_detection_feed;
use crate::remote::{CatalogClient, ImageKey, ImageTransport, ImageryClient};

/// A finished background request.
#[derive(Debug)]
pub enum TaskOutcome {
    Catalog {
        cruise: String,
        result: Result<Vec<RawFileRecord>, SurveyError>,
    },
    Detections(DetectionFeed),
    Image {
        key: ImageKey,
        result: Result<Vec<u8>, SurveyError>,
    },
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Runs requests off the UI thread.
pub struct Tasks {
    runtime: tokio::runtime::Runtime,
    tx: Sender<TaskOutcome>,
    rx: Receiver<TaskOutcome>,
    waker: Waker,
    http: reqwest::Client,
    catalog: CatalogClient,
    imagery: ImageryClient,
}

impl Tasks {
    pub fn new(config: &SurveyConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("survey-net")
            .enable_all()
            .build()
            .context("starting network runtime")?;
        let http = config.http_client()?;
        let (tx, rx) = mpsc::channel();

        Ok(Self {
            runtime,
            tx,
            rx,
            waker: Arc::new(|| {}),
            catalog: CatalogClient::new(http.clone(), config.clone()),
            imagery: ImageryClient::new(http.clone(), config.clone()),
            http,
        })
    }

    /// Called after every finished request, e.g. to request a repaint.
    pub fn set_waker(&mut self, waker: impl Fn() + Send + Sync + 'static) {
        self.waker = Arc::new(waker);
    }

    pub fn fetch_catalog(&self, cruise: String) {
        let client = self.catalog.clone();
        self.spawn(async move {
            let result = client.fetch_catalog(&cruise).await;
            TaskOutcome::Catalog { cruise, result }
        });
    }

    pub fn fetch_detections(&self, url: String) {
        let http = self.http.clone();
        self.spawn(async move { TaskOutcome::Detections(load_detection_feed(&http, &url).await) });
    }

    pub fn fetch_image(&self, key: ImageKey) {
        let client = self.imagery.clone();
        self.spawn(async move {
            let result = client.fetch(&key).await;
            TaskOutcome::Image { key, result }
        });
    }

    /// Every outcome that arrived since the last call, in arrival order.
    pub fn drain(&self) -> Vec<TaskOutcome> {
        self.rx.try_iter().collect()
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = TaskOutcome> + Send + 'static,
    {
        let tx = self.tx.clone();
        let waker = Arc::clone(&self.waker);
        self.runtime.spawn(async move {
            let outcome = task.await;
            if tx.send(outcome).is_err() {
                log::debug!("UI went away before a request finished");
                return;
            }
            waker();
        });
    }
}
