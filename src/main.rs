use clap::Parser;
use formsheet::core::Prompter;
use formsheet::core::Submitter;
use formsheet::utils::error::{ErrorSeverity, FormError};
use formsheet::utils::{logger, validation::Validate};
use formsheet::{
    ArchiveSubmitter, CliConfig, Command, FormDefinition, FormSession, LocalStorage, LogSubmitter,
};
use std::io::{BufRead, Write};

/// Prompts and alerts on the terminal.
struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, message: &str) -> Option<String> {
        print!("{}: ", message);
        std::io::stdout().flush().ok()?;
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn alert(&mut self, message: &str) {
        println!("⚠️  {}", message);
    }
}

fn exit_code(error: &FormError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn read_commands(config: &CliConfig) -> std::io::Result<Vec<String>> {
    match &config.script {
        Some(path) => Ok(std::fs::read_to_string(path)?
            .lines()
            .map(str::to_string)
            .collect()),
        None => Ok(Vec::new()),
    }
}

async fn handle_line(
    session: &mut FormSession,
    submitter: &dyn Submitter,
    prompter: &mut TerminalPrompter,
    line: &str,
) -> Result<(), FormError> {
    let Some(command) = Command::parse(line)? else {
        return Ok(());
    };

    if command == Command::Submit {
        let receipt = session.submit(submitter).await?;
        println!("✅ {}", receipt.message);
        if let Some(location) = receipt.location {
            println!("📁 Saved to: {}", location);
        }
        return Ok(());
    }

    let output = session.execute(command, prompter)?;
    println!("{}", output);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting formsheet");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let definition = match FormDefinition::from_file(&config.form) {
        Ok(definition) => definition,
        Err(e) => {
            eprintln!("❌ Failed to load form definition '{}': {}", config.form, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    let mut session = match FormSession::new(definition) {
        Ok(session) => session.with_mode(config.mode),
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e).max(1));
        }
    };

    let submitter: Box<dyn Submitter> = if config.archive {
        let storage = LocalStorage::new(config.output_path.clone());
        Box::new(ArchiveSubmitter::new(storage, config.output_path.clone()))
    } else {
        Box::new(LogSubmitter::new())
    };

    let mut prompter = TerminalPrompter;
    let interactive = config.script.is_none();
    let mut scripted = read_commands(&config)?.into_iter();
    if interactive {
        println!("{}", session.render(session.mode()));
        println!("Type 'help' for commands, Ctrl-D to quit.");
    }

    loop {
        let line = if interactive {
            print!("> ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            if std::io::stdin().lock().read_line(&mut line)? == 0 {
                break;
            }
            line
        } else {
            match scripted.next() {
                Some(line) => line,
                None => break,
            }
        };

        if let Err(e) = handle_line(&mut session, submitter.as_ref(), &mut prompter, &line).await {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let code = exit_code(&e);
            if code > 0 && !interactive {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
