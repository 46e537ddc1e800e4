//! Feeds an operation's update stream through the reducer.

use client_core::{OperationHandle, OperationUpdate, WorkflowOperation};
use shared::domain::Submission;

use super::{
    events::UiEvent,
    reducer::{reduce, ScreenState},
};

/// Maps one update onto the event the screen reacts to. List loads surface
/// progress and failure differently from per-submission actions.
pub fn event_for<T>(
    operation: WorkflowOperation,
    update: OperationUpdate<T>,
    on_complete: impl FnOnce(T) -> UiEvent,
) -> UiEvent {
    let listing = operation == WorkflowOperation::ListSubmissions;
    match update {
        OperationUpdate::InProgress if listing => UiEvent::RefreshRequested,
        OperationUpdate::InProgress => UiEvent::OperationStarted(operation),
        OperationUpdate::Completed(value) => on_complete(value),
        OperationUpdate::Failed(error) if listing => UiEvent::SubmissionsFailed(error),
        OperationUpdate::Failed(error) => UiEvent::OperationFailed { operation, error },
    }
}

pub async fn drive<T>(
    mut state: ScreenState,
    mut handle: OperationHandle<T>,
    mut on_complete: impl FnMut(T) -> UiEvent,
) -> ScreenState {
    let operation = handle.operation();
    let mut terminal = false;

    while let Some(update) = handle.next_update().await {
        terminal |= update.is_terminal();
        let event = event_for(operation, update, &mut on_complete);
        tracing::debug!(%operation, ?event, "reducing ui event");
        state = reduce(&state, event);
    }

    if !terminal {
        state = reduce(&state, UiEvent::OperationAbandoned(operation));
    }
    state
}

pub async fn drive_submission(
    state: ScreenState,
    handle: OperationHandle<Submission>,
) -> ScreenState {
    drive(state, handle, UiEvent::SubmissionChanged).await
}

pub async fn drive_list(state: ScreenState, handle: OperationHandle<Vec<Submission>>) -> ScreenState {
    drive(state, handle, UiEvent::SubmissionsLoaded).await
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
