//! Lifecycle entry points: create, read, update, delete, import

use crate::client::{SpaceClient, SpaceClientExt};
use crate::context::{NoProgress, ProgressCallback};
use crate::error::{ApplyError, Error, Result, StepKind};
use crate::executor::apply;
use crate::planner::{ExecutionPlan, plan};
use crate::types::{Collection, SpaceId, SpaceSpec, SpaceState, UNKNOWN_FINGERPRINT};

/// A plan together with the snapshot it was computed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub plan: ExecutionPlan,
    pub working: SpaceState,
}

/// Drives one client through the resource lifecycle.
///
/// The client is fixed at construction; every entry point is synchronous
/// and reconciles a single space.
pub struct Reconciler<C: SpaceClient> {
    client: C,
    refresh_keys: bool,
}

impl<C: SpaceClient> Reconciler<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            refresh_keys: false,
        }
    }

    /// List remote secret and variable keys before planning an update, and
    /// reconcile against those instead of trusting the snapshot alone.
    #[must_use]
    pub fn with_key_refresh(mut self, refresh: bool) -> Self {
        self.refresh_keys = refresh;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Create a space from scratch.
    pub fn create(&self, desired: &SpaceSpec) -> std::result::Result<SpaceState, ApplyError> {
        self.create_with(desired, &mut NoProgress)
    }

    pub fn create_with<P: ProgressCallback + ?Sized>(
        &self,
        desired: &SpaceSpec,
        progress: &mut P,
    ) -> std::result::Result<SpaceState, ApplyError> {
        apply(
            &self.client,
            None,
            &plan(desired, None),
            SpaceState::default(),
            progress,
        )
    }

    /// Fetch the remote record of `id` as a snapshot.
    ///
    /// Secret and variable keys are not readable back with their values,
    /// so both collections come back empty.
    pub fn read(&self, id: &SpaceId) -> Result<SpaceState> {
        log::debug!("Reading {id}");
        Ok(self.client.fetch(id)?.into_state())
    }

    /// Converge an existing space from `prior` to `desired`.
    pub fn update(
        &self,
        desired: &SpaceSpec,
        prior: SpaceState,
    ) -> std::result::Result<SpaceState, ApplyError> {
        self.update_with(desired, prior, &mut NoProgress)
    }

    pub fn update_with<P: ProgressCallback + ?Sized>(
        &self,
        desired: &SpaceSpec,
        prior: SpaceState,
        progress: &mut P,
    ) -> std::result::Result<SpaceState, ApplyError> {
        let prior = self.effective_prior(prior)?;
        let plan = plan(desired, Some(&prior));
        apply(&self.client, None, &plan, prior, progress)
    }

    /// Delete the space recorded in `prior`.
    pub fn delete(&self, prior: SpaceState) -> std::result::Result<(), ApplyError> {
        self.delete_with(prior, &mut NoProgress)
    }

    pub fn delete_with<P: ProgressCallback + ?Sized>(
        &self,
        prior: SpaceState,
        progress: &mut P,
    ) -> std::result::Result<(), ApplyError> {
        apply(&self.client, None, &ExecutionPlan::delete(), prior, progress).map(|_| ())
    }

    /// Adopt an existing remote space given as `owner/name`.
    pub fn import(&self, external_id: &str) -> Result<SpaceState> {
        let id = SpaceId::parse(external_id)?;
        log::info!("Importing {id}");
        self.read(&id)
    }

    /// The plan that [`create`](Self::create) or [`update`](Self::update)
    /// would run, without mutating anything.
    ///
    /// With key refresh enabled this lists remote keys (read-only calls).
    pub fn preview(&self, desired: &SpaceSpec, prior: Option<&SpaceState>) -> Result<Preview> {
        let working = match prior {
            Some(prior) if prior.is_created() && self.refresh_keys => self.refreshed(prior.clone())?,
            Some(prior) => prior.clone(),
            None => SpaceState::default(),
        };
        let plan = plan(desired, working.is_created().then_some(&working));
        Ok(Preview { plan, working })
    }

    /// Run a previewed plan as is.
    pub fn execute<P: ProgressCallback + ?Sized>(
        &self,
        preview: Preview,
        progress: &mut P,
    ) -> std::result::Result<SpaceState, ApplyError> {
        apply(&self.client, None, &preview.plan, preview.working, progress)
    }

    fn effective_prior(&self, prior: SpaceState) -> std::result::Result<SpaceState, ApplyError> {
        if !self.refresh_keys || !prior.is_created() {
            return Ok(prior);
        }
        self.refreshed(prior.clone())
            .map_err(|e| ApplyError::new(StepKind::Refresh, None, e, prior))
    }

    /// Replace recorded key sets with the remote ones; values of keys the
    /// snapshot never pushed are unknown.
    fn refreshed(&self, mut prior: SpaceState) -> Result<SpaceState> {
        let id = prior
            .id
            .clone()
            .ok_or_else(|| Error::PlanInconsistency("no remote identity to refresh".into()))?;

        for collection in [Collection::Secrets, Collection::Variables] {
            let remote = self.client.list_keys(&id, collection)?;
            let recorded = collection.recorded_mut(&mut prior);
            recorded.retain(|key, _| remote.contains(key));
            for key in remote {
                recorded
                    .entry(key)
                    .or_insert_with(|| UNKNOWN_FINGERPRINT.to_string());
            }
            log::debug!("{id}: {} {} key(s) remotely", recorded.len(), collection.noun());
        }
        Ok(prior)
    }
}
