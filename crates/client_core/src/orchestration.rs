//! Runs each workflow operation as a cancellable unit of work.
//!
//! A unit emits at most one `InProgress` and then exactly one terminal update,
//! unless it is superseded: registering a new unit under the same
//! [`OperationKey`] cancels the older one, whose stream then closes without a
//! result. The supersession check and the send of every update happen under
//! the registry lock, so a stale unit can never deliver after its successor
//! has registered.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
};

use futures::StreamExt;
use shared::domain::{
    Assignment, AssignmentId, CourseId, Material, MaterialIdentity, Submission, UserId,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    engine::{self, RemoteStep, Transition},
    error::WorkflowError,
    repository::{Clock, SubmissionRepository, SystemClock},
    types::{OperationKey, OperationUpdate, WorkflowOperation},
};

/// Room for one `InProgress` plus the terminal update.
const UPDATE_CHANNEL_CAPACITY: usize = 2;

struct Registration {
    generation: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct InflightRegistry {
    next_generation: u64,
    entries: HashMap<OperationKey, Registration>,
}

impl InflightRegistry {
    fn register(&mut self, key: &OperationKey, token: CancellationToken) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        if let Some(previous) = self
            .entries
            .insert(key.clone(), Registration { generation, token })
        {
            debug!(%key, superseded = previous.generation, "cancelling superseded operation");
            previous.token.cancel();
        }
        generation
    }

    fn is_current(&self, key: &OperationKey, generation: u64) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.generation == generation)
    }

    fn release(&mut self, key: &OperationKey, generation: u64) {
        if self.is_current(key, generation) {
            self.entries.remove(key);
        }
    }
}

type SharedRegistry = Arc<Mutex<InflightRegistry>>;

fn lock(registry: &SharedRegistry) -> MutexGuard<'_, InflightRegistry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Why a unit of work stopped before producing a value.
enum Halt {
    Cancelled,
    Failed(WorkflowError),
}

impl From<WorkflowError> for Halt {
    fn from(value: WorkflowError) -> Self {
        Halt::Failed(value)
    }
}

struct UnitOfWork<T> {
    operation: WorkflowOperation,
    key: OperationKey,
    generation: u64,
    token: CancellationToken,
    registry: SharedRegistry,
    updates: mpsc::Sender<OperationUpdate<T>>,
}

impl<T> UnitOfWork<T> {
    fn emit(&self, registry: &InflightRegistry, update: OperationUpdate<T>) -> bool {
        if self.token.is_cancelled() || !registry.is_current(&self.key, self.generation) {
            return false;
        }
        self.updates.try_send(update).is_ok()
    }

    fn started(&self) {
        let registry = lock(&self.registry);
        self.emit(&registry, OperationUpdate::InProgress);
    }

    fn check_cancelled(&self) -> Result<(), Halt> {
        if self.token.is_cancelled() {
            Err(Halt::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Awaits a repository call, abandoning it as soon as the unit is cancelled.
    async fn remote<R, F>(&self, call: F) -> Result<R, Halt>
    where
        F: Future<Output = anyhow::Result<R>>,
    {
        self.check_cancelled()?;
        let result = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(Halt::Cancelled),
            result = call => result,
        };
        self.check_cancelled()?;
        result.map_err(|err| {
            debug!(operation = %self.operation, error = %err, "repository call failed");
            Halt::Failed(WorkflowError::from_remote(&err))
        })
    }

    fn finish(self, outcome: Result<T, Halt>) {
        let mut registry = lock(&self.registry);
        match outcome {
            Ok(value) => {
                if self.emit(&registry, OperationUpdate::Completed(value)) {
                    info!(operation = %self.operation, key = %self.key, "operation completed");
                }
            }
            Err(Halt::Failed(err)) => {
                if self.emit(&registry, OperationUpdate::Failed(err.clone())) {
                    warn!(
                        operation = %self.operation,
                        key = %self.key,
                        local = err.is_local(),
                        error = %err,
                        "operation failed"
                    );
                }
            }
            Err(Halt::Cancelled) => {
                debug!(operation = %self.operation, key = %self.key, "operation cancelled");
            }
        }
        registry.release(&self.key, self.generation);
    }
}

/// Caller's view of one running unit of work.
pub struct OperationHandle<T> {
    operation: WorkflowOperation,
    key: OperationKey,
    token: CancellationToken,
    updates: ReceiverStream<OperationUpdate<T>>,
}

impl<T> OperationHandle<T> {
    pub fn operation(&self) -> WorkflowOperation {
        self.operation
    }

    pub fn key(&self) -> &OperationKey {
        &self.key
    }

    /// Cooperative: an in-flight remote call is abandoned, not aborted remotely.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn next_update(&mut self) -> Option<OperationUpdate<T>> {
        self.updates.next().await
    }

    /// Drains to the terminal update. `None` means the unit was cancelled or
    /// superseded and its result discarded.
    pub async fn outcome(mut self) -> Option<Result<T, WorkflowError>> {
        while let Some(update) = self.next_update().await {
            if let Some(result) = update.into_result() {
                return Some(result);
            }
        }
        None
    }
}

pub struct WorkflowOrchestrator {
    repository: Arc<dyn SubmissionRepository>,
    clock: Arc<dyn Clock>,
    registry: SharedRegistry,
}

impl WorkflowOrchestrator {
    pub fn new(repository: Arc<dyn SubmissionRepository>) -> Self {
        Self::with_clock(repository, Arc::new(SystemClock))
    }

    pub fn with_clock(repository: Arc<dyn SubmissionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            registry: Arc::new(Mutex::new(InflightRegistry::default())),
        }
    }

    /// Number of units still registered as the latest for their key.
    pub fn in_flight(&self) -> usize {
        lock(&self.registry).entries.len()
    }

    pub fn cancel_all(&self) {
        let mut registry = lock(&self.registry);
        for (_, entry) in registry.entries.drain() {
            entry.token.cancel();
        }
    }

    fn begin<T>(
        &self,
        operation: WorkflowOperation,
        key: OperationKey,
    ) -> (UnitOfWork<T>, OperationHandle<T>) {
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let generation = lock(&self.registry).register(&key, token.clone());
        debug!(%operation, %key, generation, "operation registered");

        let unit = UnitOfWork {
            operation,
            key: key.clone(),
            generation,
            token: token.clone(),
            registry: self.registry.clone(),
            updates: tx,
        };
        let handle = OperationHandle {
            operation,
            key,
            token,
            updates: ReceiverStream::new(rx),
        };
        (unit, handle)
    }

    pub fn list_submissions(
        &self,
        course_id: CourseId,
        assignment_id: AssignmentId,
    ) -> OperationHandle<Vec<Submission>> {
        let (unit, handle) = self.begin(
            WorkflowOperation::ListSubmissions,
            OperationKey::for_assignment(assignment_id.clone()),
        );
        let repository = self.repository.clone();
        tokio::spawn(async move {
            let outcome = async {
                resolve_caller(&unit, repository.as_ref()).await?;
                unit.started();
                unit.remote(repository.get_submissions(&course_id, &assignment_id))
                    .await
            }
            .await;
            unit.finish(outcome);
        });
        handle
    }

    pub fn get_submission(
        &self,
        course_id: CourseId,
        assignment_id: AssignmentId,
        user_id: UserId,
    ) -> OperationHandle<Submission> {
        let (unit, handle) = self.begin(
            WorkflowOperation::GetSubmission,
            OperationKey::for_submission(assignment_id.clone(), user_id.clone()),
        );
        let repository = self.repository.clone();
        tokio::spawn(async move {
            let outcome = async {
                resolve_caller(&unit, repository.as_ref()).await?;
                unit.started();
                unit.remote(repository.get_submission(&course_id, &assignment_id, &user_id))
                    .await
            }
            .await;
            unit.finish(outcome);
        });
        handle
    }

    pub fn turn_in(
        &self,
        submission: Submission,
        assignment: Assignment,
    ) -> OperationHandle<Submission> {
        let clock = self.clock.clone();
        self.spawn_transition(WorkflowOperation::TurnIn, submission, move |submission, _| {
            engine::turn_in(submission, &assignment, clock.now())
        })
    }

    pub fn reclaim(&self, submission: Submission) -> OperationHandle<Submission> {
        self.spawn_transition(WorkflowOperation::Reclaim, submission, |submission, caller| {
            engine::reclaim(submission, caller)
        })
    }

    pub fn return_submission(
        &self,
        submission: Submission,
        assignment: Assignment,
        new_grade: Option<i64>,
    ) -> OperationHandle<Submission> {
        self.spawn_transition(WorkflowOperation::Return, submission, move |submission, _| {
            engine::return_submission(submission, &assignment, new_grade)
        })
    }

    pub fn modify_attachments(
        &self,
        submission: Submission,
        add: Vec<Material>,
        remove: Vec<MaterialIdentity>,
    ) -> OperationHandle<Submission> {
        self.spawn_transition(
            WorkflowOperation::ModifyAttachments,
            submission,
            move |submission, _| engine::modify_attachments(submission, add, &remove),
        )
    }

    /// Commits the staged draft grade as the assigned grade.
    pub fn update_submission(
        &self,
        submission: Submission,
        assignment: Assignment,
    ) -> OperationHandle<Submission> {
        self.spawn_transition(
            WorkflowOperation::UpdateSubmission,
            submission,
            move |submission, _| engine::commit_draft(submission, &assignment),
        )
    }

    /// Local only: no unit of work, no `InProgress`, no repository call.
    pub fn patch_grade(
        &self,
        submission: &Submission,
        assignment: &Assignment,
        draft_grade: Option<i64>,
    ) -> Submission {
        engine::patch_grade(submission, assignment, draft_grade)
    }

    fn spawn_transition<P>(
        &self,
        operation: WorkflowOperation,
        submission: Submission,
        plan: P,
    ) -> OperationHandle<Submission>
    where
        P: FnOnce(&Submission, &UserId) -> Result<Transition, WorkflowError> + Send + 'static,
    {
        let (unit, handle) = self.begin(
            operation,
            OperationKey::for_submission(
                submission.assignment_id.clone(),
                submission.user_id.clone(),
            ),
        );
        let repository = self.repository.clone();
        tokio::spawn(async move {
            let outcome = async {
                let caller = resolve_caller(&unit, repository.as_ref()).await?;
                let transition = plan(&submission, &caller)?;
                execute(&unit, repository.as_ref(), &transition).await
            }
            .await;
            unit.finish(outcome);
        });
        handle
    }
}

impl Drop for WorkflowOrchestrator {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn resolve_caller<T>(
    unit: &UnitOfWork<T>,
    repository: &dyn SubmissionRepository,
) -> Result<UserId, Halt> {
    unit.remote(repository.current_user_id())
        .await?
        .ok_or(Halt::Failed(WorkflowError::Unauthenticated))
}

async fn execute(
    unit: &UnitOfWork<Submission>,
    repository: &dyn SubmissionRepository,
    transition: &Transition,
) -> Result<Submission, Halt> {
    unit.started();
    let target = transition.original().submission_ref();
    let mut latest = None;

    for step in transition.steps() {
        match step {
            RemoteStep::TurnIn => unit.remote(repository.turn_in_submission(&target)).await?,
            RemoteStep::Reclaim => unit.remote(repository.reclaim_submission(&target)).await?,
            RemoteStep::Return => unit.remote(repository.return_submission(&target)).await?,
            RemoteStep::UpdateSubmission(updates) => {
                latest = Some(
                    unit.remote(repository.update_submission(&target, updates))
                        .await?,
                );
            }
            RemoteStep::ModifyAttachments(attachments) => {
                latest = Some(
                    unit.remote(repository.modify_attachments(&target, attachments))
                        .await?,
                );
            }
        }
    }

    Ok(transition.merge(latest))
}

#[cfg(test)]
#[path = "tests/orchestration_tests.rs"]
mod tests;
