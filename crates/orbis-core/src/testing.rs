//! Texture loaders for exercising asynchronous construction in tests

use futures::channel::oneshot;
use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::future::Future;

use crate::error::AssetLoadError;
use crate::texture::TextureLoader;

/// Resolves every load immediately with its own path, recording the order
#[derive(Default)]
pub struct RecordingLoader {
    requested: RefCell<Vec<String>>,
    in_flight: Cell<usize>,
    max_in_flight: Cell<usize>,
    failing: HashSet<String>,
}

impl RecordingLoader {
    pub fn failing<const N: usize>(paths: [&str; N]) -> Self {
        Self {
            failing: paths.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.get()
    }
}

impl TextureLoader for RecordingLoader {
    type Texture = String;

    fn load(&self, path: &str) -> impl Future<Output = Result<String, AssetLoadError>> {
        self.requested.borrow_mut().push(path.to_string());
        self.in_flight.set(self.in_flight.get() + 1);
        self.max_in_flight
            .set(self.max_in_flight.get().max(self.in_flight.get()));
        let path = path.to_string();

        async move {
            self.in_flight.set(self.in_flight.get() - 1);
            if self.failing.contains(&path) {
                Err(AssetLoadError::Failed {
                    path,
                    reason: "not found".to_string(),
                })
            } else {
                Ok(path)
            }
        }
    }
}

/// Holds every load until the test releases it
#[derive(Default)]
pub struct GatedLoader {
    gates: RefCell<VecDeque<(String, oneshot::Sender<Result<(), String>>)>>,
}

impl GatedLoader {
    /// Number of loads issued but not yet released
    pub fn waiting(&self) -> usize {
        self.gates.borrow().len()
    }

    /// Resolve the oldest pending load, returning its path
    pub fn complete_next(&self) -> Option<String> {
        let (path, gate) = self.gates.borrow_mut().pop_front()?;
        let _ = gate.send(Ok(()));
        Some(path)
    }

    pub fn fail_next(&self, reason: &str) -> Option<String> {
        let (path, gate) = self.gates.borrow_mut().pop_front()?;
        let _ = gate.send(Err(reason.to_string()));
        Some(path)
    }
}

impl TextureLoader for GatedLoader {
    type Texture = String;

    fn load(&self, path: &str) -> impl Future<Output = Result<String, AssetLoadError>> {
        let (gate, released) = oneshot::channel();
        self.gates.borrow_mut().push_back((path.to_string(), gate));
        let path = path.to_string();

        async move {
            match released.await {
                Ok(Ok(())) => Ok(path),
                Ok(Err(reason)) => Err(AssetLoadError::Failed { path, reason }),
                Err(_) => Err(AssetLoadError::Failed {
                    path,
                    reason: "load abandoned".to_string(),
                }),
            }
        }
    }
}
