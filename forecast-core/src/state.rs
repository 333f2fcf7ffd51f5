//! Observable fetch lifecycle.
//!
//! [`ForecastStateMachine`] owns the only mutable [`FetchState`]. Every
//! transition is applied and fanned out to subscribers while holding a single
//! lock, so all subscribers see transitions in the same order they were
//! applied. Each trigger bumps a generation counter; a fetch result is applied
//! only if no newer trigger happened in the meantime.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    client::ForecastClient,
    error::FetchError,
    model::{Coordinate, ForecastPayload},
};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Loaded(Arc<ForecastPayload>),
    Failed(FetchError),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn payload(&self) -> Option<&ForecastPayload> {
        match self {
            FetchState::Loaded(payload) => Some(payload.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FetchState::Idle => "idle",
            FetchState::Loading => "loading",
            FetchState::Loaded(_) => "loaded",
            FetchState::Failed(_) => "failed",
        }
    }
}

impl From<Result<ForecastPayload, FetchError>> for FetchState {
    fn from(result: Result<ForecastPayload, FetchError>) -> Self {
        match result {
            Ok(payload) => FetchState::Loaded(Arc::new(payload)),
            Err(err) => FetchState::Failed(err),
        }
    }
}

/// A transition as delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    /// Generation of the trigger that produced this state.
    pub generation: u64,
    pub state: FetchState,
}

pub type StateReceiver = mpsc::UnboundedReceiver<StateUpdate>;

#[derive(Debug, Default)]
struct Shared {
    state: FetchState,
    generation: u64,
    subscribers: Vec<mpsc::UnboundedSender<StateUpdate>>,
}

impl Shared {
    fn publish(&mut self, state: FetchState) {
        tracing::trace!(generation = self.generation, state = state.as_str(), "transition");

        let update = StateUpdate { generation: self.generation, state: state.clone() };
        self.state = state;
        // Closed receivers are dropped here.
        self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());
    }
}

pub struct ForecastStateMachine<C> {
    client: Arc<C>,
    shared: Arc<Mutex<Shared>>,
}

impl<C> Clone for ForecastStateMachine<C> {
    fn clone(&self) -> Self {
        Self { client: Arc::clone(&self.client), shared: Arc::clone(&self.shared) }
    }
}

impl<C> std::fmt::Debug for ForecastStateMachine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("ForecastStateMachine")
            .field("state", &shared.state.as_str())
            .field("generation", &shared.generation)
            .field("subscribers", &shared.subscribers.len())
            .finish()
    }
}

impl<C: ForecastClient + 'static> ForecastStateMachine<C> {
    pub fn new(client: C) -> Self {
        Self { client: Arc::new(client), shared: Arc::new(Mutex::new(Shared::default())) }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FetchState {
        self.shared.lock().state.clone()
    }

    pub fn generation(&self) -> u64 {
        self.shared.lock().generation
    }

    /// Receive every transition applied from now on. The current state is not
    /// replayed; use [`state`](Self::state) for that.
    pub fn subscribe(&self) -> StateReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.lock().subscribers.push(tx);
        rx
    }

    /// Enter `Loading` right away, then fetch on a spawned task.
    ///
    /// The returned handle resolves to `true` if the fetch result was applied
    /// and `false` if a newer trigger superseded it. Must be called from
    /// within a tokio runtime.
    pub fn trigger(&self, coordinate: Coordinate) -> JoinHandle<bool> {
        let generation = self.begin(&coordinate);
        let this = self.clone();

        tokio::spawn(async move {
            let result = this.client.fetch_forecast(&coordinate).await;
            this.complete(generation, result).is_some()
        })
    }

    /// Like [`trigger`](Self::trigger) but awaits the fetch inline. Returns
    /// the applied state, or `None` if a newer trigger superseded this one.
    pub async fn refresh(&self, coordinate: &Coordinate) -> Option<FetchState> {
        let generation = self.begin(coordinate);
        let result = self.client.fetch_forecast(coordinate).await;
        self.complete(generation, result)
    }

    fn begin(&self, coordinate: &Coordinate) -> u64 {
        let mut shared = self.shared.lock();
        shared.generation = shared.generation.wrapping_add(1);
        tracing::debug!(generation = shared.generation, location = %coordinate.name, "fetch triggered");
        shared.publish(FetchState::Loading);
        shared.generation
    }

    fn complete(
        &self,
        generation: u64,
        result: Result<ForecastPayload, FetchError>,
    ) -> Option<FetchState> {
        let mut shared = self.shared.lock();
        if shared.generation != generation {
            tracing::debug!(
                stale = generation,
                current = shared.generation,
                "discarding superseded fetch result"
            );
            return None;
        }

        let state = FetchState::from(result);
        shared.publish(state.clone());
        Some(state)
    }
}
