//! Execution engine - applies mutation steps in order, stopping at the first failure

use crate::client::{SpaceClient, SpaceClientExt};
use crate::context::ProgressCallback;
use crate::error::{ApplyError, Error, StepKind};
use crate::planner::{ExecutionPlan, MutationStep};
use crate::types::{Collection, SpaceId, SpaceSpec, SpaceState};

/// Why a single step failed
struct StepFailure {
    kind: StepKind,
    key: Option<String>,
    error: Error,
    partial_create: bool,
}

impl StepFailure {
    fn of(step: &MutationStep, error: Error) -> Self {
        Self {
            kind: step.kind(),
            key: step.key().map(str::to_string),
            error,
            partial_create: false,
        }
    }
}

/// Execute a plan against the remote, amending `working` after every
/// successful step.
///
/// # Arguments
/// * `client` - Remote client
/// * `identity` - Identity to address; defaults to the one in `working`
/// * `plan` - The plan to run, in order
/// * `working` - Snapshot the plan was computed against
/// * `progress` - Progress callback
///
/// # Returns
/// The converged snapshot, or an [`ApplyError`] holding the snapshot as it
/// stood when the failing step was attempted.
pub fn apply<C, P>(
    client: &C,
    identity: Option<&SpaceId>,
    plan: &ExecutionPlan,
    mut working: SpaceState,
    progress: &mut P,
) -> Result<SpaceState, ApplyError>
where
    C: SpaceClient + ?Sized,
    P: ProgressCallback + ?Sized,
{
    if let Some(reason) = plan.invalid_reason() {
        return Err(ApplyError::new(
            StepKind::Invalid,
            None,
            Error::PlanInconsistency(reason.to_string()),
            working,
        ));
    }

    if let Some(id) = identity {
        working.id = Some(id.clone());
    }

    let total = plan.len();
    progress.on_plan_start(total);

    for (index, step) in plan.steps.iter().enumerate() {
        progress.on_step_start(index, step);
        log::debug!("Step {}/{}: {}", index + 1, total, step);

        match apply_step(client, step, &mut working) {
            Ok(()) => progress.on_step_complete(index, step, None),
            Err(failure) => {
                log::debug!("Step {}/{} failed: {}", index + 1, total, failure.error);
                progress.on_step_complete(index, step, Some(&failure.error));
                let err = ApplyError::new(failure.kind, failure.key, failure.error, working);
                return Err(if failure.partial_create {
                    err.into_partial_create()
                } else {
                    err
                });
            }
        }
    }

    Ok(working)
}

/// Apply one step; `working` is only touched once the remote call succeeded.
fn apply_step<C>(
    client: &C,
    step: &MutationStep,
    working: &mut SpaceState,
) -> Result<(), StepFailure>
where
    C: SpaceClient + ?Sized,
{
    if let MutationStep::Create(spec) = step {
        return create(client, spec, working);
    }

    let Some(id) = working.id.clone() else {
        return Err(StepFailure::of(
            step,
            Error::PlanInconsistency(format!("cannot {} without a remote identity", step.kind())),
        ));
    };
    let fail = |error| StepFailure::of(step, error);

    match step {
        MutationStep::Rename { to } => {
            let renamed = client.rename(&id, to.name()).map_err(fail)?;
            working.name = renamed.name().to_string();
            working.id = Some(renamed);
        }
        MutationStep::SetVisibility { private } => {
            client.set_visibility(&id, *private).map_err(fail)?;
            working.private = Some(*private);
        }
        MutationStep::SetHardware { tier } => {
            client.set_hardware(&id, tier).map_err(fail)?;
            working.hardware = Some(tier.clone());
        }
        MutationStep::SetStorage { tier } => {
            client.set_storage(&id, tier).map_err(fail)?;
            working.storage = Some(tier.clone());
        }
        MutationStep::SetSleepTime { seconds } => {
            client.set_sleep_time(&id, *seconds).map_err(fail)?;
            working.sleep_time = Some(*seconds);
        }
        MutationStep::RemoveKey { collection, key } => {
            client.remove_key(&id, *collection, key).map_err(fail)?;
            collection.recorded_mut(working).remove(key);
        }
        MutationStep::AddKey {
            collection,
            key,
            value,
        } => {
            client.add_key(&id, *collection, key, value).map_err(fail)?;
            collection
                .recorded_mut(working)
                .insert(key.clone(), collection.fingerprint(value));
        }
        MutationStep::Delete => {
            client.delete(&id).map_err(fail)?;
            working.id = None;
        }
        MutationStep::Invalid { reason } => {
            return Err(fail(Error::PlanInconsistency(reason.clone())));
        }
        MutationStep::Create(_) => {}
    }
    Ok(())
}

/// Create call followed by one push per declared key.
fn create<C>(client: &C, spec: &SpaceSpec, working: &mut SpaceState) -> Result<(), StepFailure>
where
    C: SpaceClient + ?Sized,
{
    let id = client.create(spec).map_err(|error| StepFailure {
        kind: StepKind::Create,
        key: None,
        error,
        partial_create: false,
    })?;
    log::debug!("Created {id}");
    *working = SpaceState::created(id.clone(), spec);

    for collection in [Collection::Secrets, Collection::Variables] {
        for (key, value) in collection.declared(spec) {
            let pushed = client.add_key(&id, collection, key, value);
            if let Err(error) = pushed {
                let step = MutationStep::AddKey {
                    collection,
                    key: key.clone(),
                    value: String::new(),
                };
                return Err(StepFailure {
                    partial_create: true,
                    ..StepFailure::of(&step, error)
                });
            }
            collection
                .recorded_mut(working)
                .insert(key.clone(), collection.fingerprint(value));
        }
    }
    Ok(())
}
