mod controller;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use client_core::{
    config::{load_settings_from, DEFAULT_SETTINGS_FILE},
    HttpSubmissionRepository, SubmissionRepository, WorkflowOrchestrator,
};
use shared::domain::{
    Assignment, AssignmentId, CourseId, Material, MaterialIdentity, Submission, UserId,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use controller::{
    dispatch::{drive_list, drive_submission},
    events::{UiError, UiEvent},
    reducer::{reduce, return_request, rows, selected_detail, ScreenState},
};

#[derive(Parser, Debug)]
#[command(name = "classroom", about = "Coursework submissions and grading")]
struct Cli {
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct Target {
    #[arg(long)]
    course: String,
    #[arg(long)]
    work: String,
    /// Defaults to the signed-in user.
    #[arg(long)]
    user: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every submission for an assignment with its status.
    List {
        #[arg(long)]
        course: String,
        #[arg(long)]
        work: String,
    },
    /// Show one submission and what returning it would do.
    Show {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        grade: Option<i64>,
    },
    TurnIn {
        #[command(flatten)]
        target: Target,
    },
    /// Unsubmit previously turned-in work.
    Reclaim {
        #[command(flatten)]
        target: Target,
    },
    Return {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        grade: Option<i64>,
    },
    /// Save a grade without returning the work.
    Grade {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        grade: i64,
    },
    Attach {
        #[command(flatten)]
        target: Target,
        #[arg(long = "link")]
        links: Vec<String>,
        #[arg(long = "drive-file")]
        drive_files: Vec<String>,
        #[arg(long = "remove-link")]
        remove_links: Vec<String>,
        #[arg(long = "remove-drive-file")]
        remove_drive_files: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

struct Session {
    repository: Arc<HttpSubmissionRepository>,
    orchestrator: WorkflowOrchestrator,
}

impl Session {
    async fn assignment(&self, course: &str, work: &str) -> Result<Assignment> {
        self.repository
            .fetch_assignment(&CourseId::new(course), &AssignmentId::new(work))
            .await
            .with_context(|| format!("failed to load course work {work}"))
    }

    /// Loads the assignment and the target's submission into a fresh screen.
    async fn open(&self, target: &Target) -> Result<(Assignment, ScreenState)> {
        let assignment = self.assignment(&target.course, &target.work).await?;
        let user_id = match &target.user {
            Some(user) => UserId::new(user.as_str()),
            None => self
                .repository
                .current_user_id()
                .await?
                .context("not signed in; set CLASSROOM_ACCESS_TOKEN")?,
        };

        let state = reduce(
            &ScreenState::default(),
            UiEvent::AssignmentLoaded(assignment.clone()),
        );
        let state = drive_submission(
            state,
            self.orchestrator.get_submission(
                assignment.course_id.clone(),
                assignment.id.clone(),
                user_id.clone(),
            ),
        )
        .await;
        let state = reduce(&state, UiEvent::SubmissionSelected(user_id));
        Ok((assignment, state))
    }
}

fn selected(state: &ScreenState) -> Option<Submission> {
    selected_detail(state, Utc::now()).map(|detail| detail.submission)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let settings = load_settings_from(&cli.config, |key| std::env::var(key).ok())?;
    let repository = Arc::new(HttpSubmissionRepository::new(&settings)?);
    let session = Session {
        orchestrator: WorkflowOrchestrator::new(repository.clone()),
        repository,
    };
    info!(base_url = %settings.api_base_url, "starting");

    let state = match cli.command {
        Command::List { course, work } => {
            let assignment = session.assignment(&course, &work).await?;
            let state = reduce(
                &ScreenState::default(),
                UiEvent::AssignmentLoaded(assignment.clone()),
            );
            drive_list(
                state,
                session
                    .orchestrator
                    .list_submissions(assignment.course_id, assignment.id),
            )
            .await
        }
        Command::Show { target, grade } => {
            let (_, state) = session.open(&target).await?;
            match grade {
                Some(grade) => reduce(&state, UiEvent::PendingGradeChanged(Some(grade))),
                None => state,
            }
        }
        Command::TurnIn { target } => {
            let (assignment, state) = session.open(&target).await?;
            match selected(&state) {
                Some(submission) => {
                    let handle = session.orchestrator.turn_in(submission, assignment);
                    drive_submission(state, handle).await
                }
                None => state,
            }
        }
        Command::Reclaim { target } => {
            let (_, state) = session.open(&target).await?;
            match selected(&state) {
                Some(submission) => {
                    let handle = session.orchestrator.reclaim(submission);
                    drive_submission(state, handle).await
                }
                None => state,
            }
        }
        Command::Return { target, grade } => {
            let (assignment, state) = session.open(&target).await?;
            let state = reduce(&state, UiEvent::PendingGradeChanged(grade));
            match return_request(&state, Utc::now()) {
                Ok(detail) => {
                    println!("{}", detail.dialog.message());
                    let handle = session.orchestrator.return_submission(
                        detail.submission,
                        assignment,
                        state.pending_grade,
                    );
                    drive_submission(state, handle).await
                }
                Err(blocked) => {
                    eprintln!("cannot return: {}", blocked.message());
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Grade { target, grade } => {
            let (assignment, state) = session.open(&target).await?;
            match selected(&state) {
                Some(submission) => {
                    let staged =
                        session
                            .orchestrator
                            .patch_grade(&submission, &assignment, Some(grade));
                    let state = reduce(&state, UiEvent::SubmissionChanged(staged.clone()));
                    let handle = session.orchestrator.update_submission(staged, assignment);
                    drive_submission(state, handle).await
                }
                None => state,
            }
        }
        Command::Attach {
            target,
            links,
            drive_files,
            remove_links,
            remove_drive_files,
        } => {
            let (_, state) = session.open(&target).await?;
            match selected(&state) {
                Some(submission) => {
                    let add = links
                        .into_iter()
                        .map(|url| Material::Link { url, title: None })
                        .chain(drive_files.into_iter().map(|id| Material::DriveFile {
                            title: id.clone(),
                            id,
                            alternate_link: None,
                        }))
                        .collect();
                    let remove = remove_links
                        .into_iter()
                        .map(MaterialIdentity::Link)
                        .chain(remove_drive_files.into_iter().map(MaterialIdentity::DriveFile))
                        .collect();
                    let handle = session
                        .orchestrator
                        .modify_attachments(submission, add, remove);
                    drive_submission(state, handle).await
                }
                None => state,
            }
        }
    };

    Ok(render(&state))
}

fn render(state: &ScreenState) -> ExitCode {
    let now = Utc::now();

    if let Some(error) = &state.error {
        report(error);
        return ExitCode::FAILURE;
    }

    match selected_detail(state, now) {
        Some(detail) => {
            let submission = &detail.submission;
            println!("{} ({})", submission.user_id, submission.state);
            println!("  status: {}", detail.status.label());
            if let Some(sub_label) = detail.status.sub_label() {
                println!("          {sub_label}");
            }
            for material in &submission.attachments {
                println!("  attached: {}", material.identity());
            }
            println!(
                "  return: {}",
                if detail.can_return {
                    "available"
                } else {
                    "unavailable"
                }
            );
        }
        None => {
            for row in rows(state, now) {
                println!(
                    "{:<24} {:<10} {}",
                    row.user_id.as_str(),
                    row.state.to_string(),
                    row.status.label()
                );
            }
        }
    }

    match &state.notice {
        Some(notice) => {
            report(notice);
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    }
}

fn report(error: &UiError) {
    debug!(category = ?error.category(), context = ?error.context(), "reporting error");
    eprintln!("{}", error.message());
    if error.requires_reauth() {
        eprintln!("sign in again: set CLASSROOM_ACCESS_TOKEN to a fresh token");
    }
}
