use crate::diagnostics::parse_stderr;
use crate::error::{KickstartError, KsResult};
use crate::validator::Validate;
use colored::Colorize;
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tower_lsp::lsp_types::Diagnostic;

/// One problem found in a file, with a 1-based line when known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub line: Option<u32>,
    pub message: String,
}

impl Problem {
    fn from_diagnostic(diagnostic: &Diagnostic) -> Self {
        Self {
            line: Some(diagnostic.range.start.line + 1),
            message: diagnostic.message.clone(),
        }
    }
}

/// Run the validator on `file` and collect what it reports.
///
/// A failing run whose output cannot be paired into diagnostics still
/// counts as one problem carrying the raw output.
pub async fn check_file(file: &Path, validator: &dyn Validate) -> KsResult<Vec<Problem>> {
    if !file.exists() {
        return Err(KickstartError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("File not found: {}", file.display()),
        )));
    }

    let Some(stderr) = validator.run(file).await? else {
        return Ok(Vec::new());
    };

    let problems: Vec<Problem> = parse_stderr(&stderr, None)
        .iter()
        .map(Problem::from_diagnostic)
        .collect();
    if !problems.is_empty() {
        return Ok(problems);
    }

    let raw = stderr.trim();
    Ok(vec![Problem {
        line: None,
        message: if raw.is_empty() {
            "ksvalidator rejected the file".to_string()
        } else {
            raw.to_string()
        },
    }])
}

fn print_problems(file: &Path, problems: &[Problem]) {
    if problems.is_empty() {
        println!("{} {}", "✅".green(), file.display());
        return;
    }

    println!(
        "{} {} ({} problem(s))",
        "❌".red(),
        file.display().to_string().bold(),
        problems.len()
    );
    for problem in problems {
        match problem.line {
            Some(line) => println!(
                "   {}:{}: {}",
                file.display(),
                line.to_string().yellow(),
                problem.message
            ),
            None => println!("   {}: {}", file.display(), problem.message),
        }
    }
}

/// Execute the lint command
pub async fn lint(files: Vec<PathBuf>, validator: &dyn Validate) -> KsResult<()> {
    println!("{}", "🔍 Linting kickstart files".bold().green());
    println!();

    let mut total = 0;
    for file in &files {
        let problems = check_file(file, validator).await?;
        print_problems(file, &problems);
        total += problems.len();
    }

    println!();
    if total > 0 {
        return Err(KickstartError::LintFailed { problems: total });
    }
    println!("{}", "✅ No problems found".bold().green());
    Ok(())
}

async fn run_watch_action(file: &Path, validator: &dyn Validate) {
    match check_file(file, validator).await {
        Ok(problems) => print_problems(file, &problems),
        Err(e) => eprintln!("{} {}", "❌".red(), e),
    }
}

fn is_watched(event_path: &Path, canonical_path: &Path) -> bool {
    if let Ok(event_canonical) = event_path.canonicalize() {
        if event_canonical == canonical_path {
            return true;
        }
    }
    // Editors often save by rename, so the original path may be gone
    event_path.file_name().is_some() && event_path.file_name() == canonical_path.file_name()
}

/// Execute the watch command
pub async fn watch(file: PathBuf, validator: &dyn Validate) -> KsResult<()> {
    println!("{}", "👁️  kickstart-ls - Watch Mode".bold().green());
    println!("   Watching: {}", file.display());
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    if !file.exists() {
        return Err(KickstartError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("File not found: {}", file.display()),
        )));
    }

    let canonical_path = file.canonicalize()?;
    let parent_dir = canonical_path
        .parent()
        .ok_or_else(|| KickstartError::Watch("Cannot determine parent directory".to_string()))?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    // Debounce to avoid rapid-fire events during file saves
    let mut debouncer = new_debouncer(
        Duration::from_millis(200),
        move |result: DebounceEventResult| {
            let _ = tx.send(result);
        },
    )
    .map_err(|e| KickstartError::Watch(format!("Failed to create file watcher: {}", e)))?;

    debouncer
        .watcher()
        .watch(parent_dir, RecursiveMode::NonRecursive)
        .map_err(|e| KickstartError::Watch(format!("Failed to watch directory: {}", e)))?;

    println!("{}", "🔄 Initial run...".cyan());
    run_watch_action(&file, validator).await;
    println!();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            received = rx.recv() => match received {
                Some(Ok(events)) => {
                    let relevant = events.iter().any(|event| {
                        event.kind == DebouncedEventKind::Any
                            && is_watched(&event.path, &canonical_path)
                    });
                    if relevant {
                        println!("\n{}", "🔄 Change detected".cyan());
                        run_watch_action(&file, validator).await;
                        println!();
                    }
                }
                Some(Err(error)) => eprintln!("{} Watch error: {}", "❌".red(), error),
                None => break,
            },
        }
    }

    println!("{}", "Stopped watching".dimmed());
    Ok(())
}
