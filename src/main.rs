//! task-tree command line entry point.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use task_tree::cli::{Cli, Command};
use task_tree::config::ConfigLoader;
use task_tree::db::Database;
use task_tree::error::EngineError;
use task_tree::format::{
    OutputFormat, format_history_markdown, format_task_markdown, format_task_tree_markdown,
    format_tasks_markdown, format_transition_markdown, to_json,
};
use task_tree::logging::{LogTarget, init_logging};
use task_tree::notify::LogNotifier;
use task_tree::service::TaskService;
use task_tree::types::StatusTransition;
use tracing::{debug, error};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&LogTarget::parse(&cli.log), cli.verbose) {
        eprintln!("Error: failed to initialize logging: {:#}", e);
        return ExitCode::from(2);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<EngineError>() {
            Some(engine_error) => {
                eprintln!("Error [{:?}]: {}", engine_error.code, engine_error.message);
                if engine_error.code.is_client_error() {
                    ExitCode::from(1)
                } else {
                    error!(code = ?engine_error.code, "engine failure");
                    ExitCode::from(2)
                }
            }
            None => {
                eprintln!("Error: {:#}", e);
                ExitCode::from(2)
            }
        },
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut loader = match &cli.config {
        Some(path) => ConfigLoader::load_file(PathBuf::from(path))?,
        None => ConfigLoader::load()?,
    };
    for (tier, path) in loader.sources() {
        debug!(%tier, path = %path.display(), "config source");
    }

    let config = loader.config_mut();
    if let Some(db_path) = &cli.database {
        config.database.path = db_path.into();
    }
    let config = loader.into_config();

    let db = Database::open_with(&config.database.path, &config.database)?;
    let service = TaskService::new(db)
        .with_notifier(Arc::new(LogNotifier))
        .with_defaults(config.tasks.clone());

    let format = cli.format;

    match cli.command {
        Command::Create(args) => {
            let task = service.create_task(args.into_new_task())?;
            print(format, &task, format_task_markdown)
        }
        Command::Get { id } => match service.get_task_with_subtasks(id)? {
            Some(tree) => print(format, &tree, format_task_tree_markdown),
            None => Err(EngineError::task_not_found(id).into()),
        },
        Command::Update(args) => match service.update_task(args.id, args.to_update())? {
            Some(task) => print(format, &task, format_task_markdown),
            None => Err(EngineError::task_not_found(args.id).into()),
        },
        Command::List(args) => {
            let options = args.to_options(service.default_sort())?;
            let tasks = service.list_parent_tasks(&options)?;
            print(format, &tasks, |t: &Vec<_>| format_tasks_markdown(t))
        }
        Command::Attach { parent, subtasks } => {
            let tree = service.attach_subtasks(parent, &subtasks)?;
            print(format, &tree, format_task_tree_markdown)
        }
        Command::Detach { parent, subtask } => {
            service.detach_subtask(parent, subtask)?;
            match service.get_task_with_subtasks(parent)? {
                Some(tree) => print(format, &tree, format_task_tree_markdown),
                None => Err(EngineError::task_not_found(parent).into()),
            }
        }
        Command::Delete { id, detach } => {
            let (task, _) = service.delete_task(id, detach)?;
            print(format, &task, format_task_markdown)
        }
        Command::Status { id, status } => {
            print_transition(format, &service.set_task_status_label(id, &status)?)
        }
        Command::Start { id } => print_transition(format, &service.start_task(id)?),
        Command::Complete { id } => print_transition(format, &service.complete_task(id)?),
        Command::Block { id } => print_transition(format, &service.mark_blocked(id)?),
        Command::Reopen { id } => print_transition(format, &service.reopen_task(id)?),
        Command::History { id } => {
            if service.get_task(id)?.is_none() {
                return Err(EngineError::task_not_found(id).into());
            }
            let history = service.get_status_history(id)?;
            print(format, &history, |h: &Vec<_>| format_history_markdown(h))
        }
    }
}

fn print<T, F>(format: OutputFormat, value: &T, markdown: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Json => println!("{}", to_json(value)?),
        OutputFormat::Markdown => print!("{}", markdown(value)),
    }
    Ok(())
}

fn print_transition(format: OutputFormat, transition: &StatusTransition) -> Result<()> {
    print(format, transition, format_transition_markdown)
}
