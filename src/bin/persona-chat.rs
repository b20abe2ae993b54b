use std::io::{self, BufRead, IsTerminal, Write};

use clap::{Parser, Subcommand};
use colored::*;
use persona_chat::config::Config;
use persona_chat::playback::default_player;
use persona_chat::tts::Speaker;
use persona_chat::{is_exit_command, ChatError, Persona, Session};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use spinners::{Spinner, Spinners};

/// Command line arguments for the persona chat CLI
#[derive(Parser)]
#[clap(
    name = "persona-chat",
    about = "Chat with a fictional character from the terminal or the browser"
)]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,

    /// Model name to use instead of PERSONA_MODEL
    #[arg(long, global = true)]
    model: Option<String>,

    /// System prompt to use instead of PERSONA_SYSTEM_PROMPT
    #[arg(long, global = true)]
    system: Option<String>,

    /// Speak every reply through the configured TTS provider
    #[arg(long, global = true)]
    voice: bool,

    /// Label printed in front of replies
    #[arg(long, global = true, default_value = "Rick")]
    name: String,
}

#[derive(Subcommand)]
enum Command {
    /// Chat in the terminal (the default)
    Chat {
        /// Save speech to disk without playing it
        #[arg(long)]
        no_playback: bool,
    },
    /// Serve the browser chat UI
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
    },
}

/// Reads configuration and applies command line overrides. Any failure here
/// ends the program before the first turn.
fn load_config(args: &CliArgs) -> Result<Config, ChatError> {
    let mut config = Config::from_env()?;
    if let Some(model) = args.model.clone() {
        config.model = model;
    }
    if let Some(system) = args.system.clone() {
        config.persona = Persona::new(system)?;
    }
    Ok(config)
}

fn build_speaker(config: &Config, playback: bool) -> Result<Speaker, ChatError> {
    let voice = config.voice()?;
    let provider = voice.provider(config.timeout_seconds)?;
    Ok(Speaker::new(
        provider,
        default_player(playback),
        config.output_dir.clone(),
    )
    .with_prefix(voice.artifact_prefix()))
}

/// Prints a startup error and ends the program.
fn fail(e: ChatError) -> ! {
    eprintln!("{} {}", "Error:".bright_red(), e);
    std::process::exit(1);
}

/// Speaks a reply. Voice failures are reported and otherwise ignored: the
/// reply is already printed and recorded.
async fn voice_reply(speaker: Option<&Speaker>, reply: &str) {
    if let Some(speaker) = speaker {
        match speaker.speak(reply).await {
            Ok(path) => log::debug!("spoke reply from {}", path.display()),
            Err(e) => eprintln!("{} {}", "Voice error:".bright_yellow(), e),
        }
    }
}

/// Non-interactive mode: every stdin line is one user input.
async fn run_piped(
    session: &mut Session,
    speaker: Option<&Speaker>,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        if is_exit_command(&line) {
            break;
        }
        match session.submit(&line).await {
            Ok(reply) => {
                println!("{name}: {reply}");
                voice_reply(speaker, &reply).await;
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    Ok(())
}

async fn run_interactive(
    session: &mut Session,
    speaker: Option<&Speaker>,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "═".repeat(50).bright_black());
    println!("{}", format!("  {name} (Terminal Version)").bright_cyan());
    println!("  {}", "Type 'exit', 'quit' or 'bye' to stop.".bright_black());
    println!("{}", "═".repeat(50).bright_black());

    let mut rl = DefaultEditor::new()?;
    let label = format!("{name}:");

    loop {
        io::stdout().flush()?;
        match rl.readline("You: ") {
            Ok(line) => {
                if is_exit_command(&line) {
                    println!("{} Closing the portal. Bye.", label.bright_green());
                    break;
                }
                let _ = rl.add_history_entry(line.as_str());

                let mut sp =
                    Spinner::new(Spinners::Dots12, "Thinking...".bright_magenta().to_string());

                match session.submit(&line).await {
                    Ok(reply) => {
                        sp.stop();
                        print!("\r\x1B[K");
                        println!("\n{} {}\n", label.bright_green(), reply);
                        voice_reply(speaker, &reply).await;
                    }
                    Err(e) => {
                        sp.stop();
                        print!("\r\x1B[K");
                        eprintln!("{} {}", "Error:".bright_red(), e);
                    }
                }
                println!("{}", "─".repeat(50).bright_black());
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\n{}", "👋 Goodbye!".bright_cyan());
                break;
            }
            Err(err) => {
                eprintln!("{} {:?}", "Error:".bright_red(), err);
                break;
            }
        }
    }

    Ok(())
}

/// Main entry point for the persona chat CLI
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    persona_chat::init_logging();
    let args = CliArgs::parse();

    let config = load_config(&args).unwrap_or_else(|e| fail(e));

    let provider = config.chat_provider().unwrap_or_else(|e| fail(e));
    let mut session = Session::new(config.persona.clone(), provider);

    match args.command.unwrap_or(Command::Chat { no_playback: false }) {
        Command::Serve { addr } => {
            #[cfg(feature = "api")]
            {
                let mut server = persona_chat::api::Server::new(session);
                if args.voice {
                    let voice = config
                        .voice()
                        .and_then(|voice| voice.provider(config.timeout_seconds))
                        .unwrap_or_else(|e| fail(e));
                    server = server.with_voice(voice);
                }
                println!("Chat UI on {}", format!("http://{addr}").bright_green());
                server.run(&addr).await?;
            }
            #[cfg(not(feature = "api"))]
            {
                let _ = (addr, session);
                eprintln!(
                    "{} built without the `api` feature",
                    "Error:".bright_red()
                );
                std::process::exit(1);
            }
        }
        Command::Chat { no_playback } => {
            let speaker = if args.voice {
                Some(build_speaker(&config, !no_playback).unwrap_or_else(|e| fail(e)))
            } else {
                None
            };

            if io::stdin().is_terminal() {
                run_interactive(&mut session, speaker.as_ref(), &args.name).await?;
            } else {
                run_piped(&mut session, speaker.as_ref(), &args.name).await?;
            }
        }
    }

    Ok(())
}
