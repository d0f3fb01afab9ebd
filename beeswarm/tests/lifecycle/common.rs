//! Shared fakes for lifecycle tests

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use beeswarm::acquire::ConfigFetcher;
use beeswarm::instance::{Service, ServiceFactory, ShutdownSignal};
use beeswarm::{Configuration, FetchError};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Started(Option<Configuration>),
    Stopped(Option<Configuration>),
}

/// Ordered record of instance starts and stops
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }
}

struct Recorder {
    config: Option<Configuration>,
    journal: Journal,
}

#[async_trait]
impl Service for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn run(self: Box<Self>, mut shutdown: ShutdownSignal) -> Result<()> {
        shutdown.triggered().await;
        self.journal.push(Event::Stopped(self.config.clone()));
        Ok(())
    }
}

/// Factory whose services only record their lifecycle
pub struct RecorderFactory {
    pub journal: Journal,
}

impl ServiceFactory for RecorderFactory {
    fn create(&self, config: Option<Configuration>) -> Result<Box<dyn Service>> {
        self.journal.push(Event::Started(config.clone()));
        Ok(Box::new(Recorder {
            config,
            journal: self.journal.clone(),
        }))
    }
}

/// Serves documents from memory and persists them like the http fetcher
pub struct StaticFetcher {
    pub documents: HashMap<String, Configuration>,
}

#[async_trait]
impl ConfigFetcher for StaticFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<Configuration, FetchError> {
        let config = self
            .documents
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;
        config.persist(destination).await?;
        Ok(config)
    }
}

pub fn config(value: serde_json::Value) -> Configuration {
    serde_json::from_value(value).unwrap()
}

/// Poll `condition` every few milliseconds for up to two seconds
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
