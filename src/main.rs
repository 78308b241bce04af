use clap::Parser;
use raffle_draw::config::toml_config::MAX_POOL_SIZE;
use raffle_draw::utils::error::{ErrorSeverity, RaffleError};
use raffle_draw::utils::logger;
use raffle_draw::{
    CliConfig, DrawSession, FileStore, KeyValueStore, Phase, RevealAnimator, RevealEvent,
    SessionState, SessionStore,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    };

    logger::init_cli_logger(cli.verbose, config.log_format()?);
    tracing::info!("Starting raffle");
    if cli.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    let store = SessionStore::with_key(
        FileStore::new(&config.storage.dir),
        config.storage.key.clone(),
    );
    let animator = RevealAnimator::new(config.reveal_settings());
    let mut session = DrawSession::new(store, animator);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    if session.check_for_saved_session() {
        let Some(answer) = prompt(&mut input, "A previous draw was interrupted. Resume it? [Y/n] ")
            .await?
        else {
            return Ok(());
        };
        if answer.trim().eq_ignore_ascii_case("n") {
            session.discard_saved();
            println!("Saved draw discarded.");
        } else {
            match session.restore() {
                Ok(state) => print_history(state),
                Err(e) => report(&e),
            }
        }
    }

    loop {
        match session.current_state().phase() {
            Phase::Idle | Phase::Configuring | Phase::Complete => {
                session.begin_configuring();
                let question = format!(
                    "Pool size N [{}] (q to quit): ",
                    config.pool.default_size
                );
                let Some(line) = prompt(&mut input, &question).await? else {
                    break;
                };
                let line = line.trim();
                if line.eq_ignore_ascii_case("q") {
                    break;
                }

                let total = if line.is_empty() {
                    Ok(config.pool.default_size)
                } else {
                    parse_pool_size(line)
                };
                match total.and_then(|total| session.begin(total).map(|_| total)) {
                    Ok(total) => println!("🎟️ Drawing from 1 to {}", total),
                    Err(e) => report(&e),
                }
            }
            Phase::Active => {
                let Some(line) =
                    prompt(&mut input, "[Enter] draw, [h] history, [n] new, [q] quit: ").await?
                else {
                    break;
                };
                match line.trim() {
                    "" | "d" => match session.draw() {
                        Ok(()) => reveal(&mut session).await,
                        Err(e) => report(&e),
                    },
                    "h" => print_history(session.current_state()),
                    "n" => session.discard(),
                    "q" => break,
                    other => println!("Unknown command '{}'", other),
                }
            }
        }
    }

    tracing::info!("Bye");
    Ok(())
}

async fn prompt(input: &mut Input, question: &str) -> std::io::Result<Option<String>> {
    print!("{}", question);
    std::io::stdout().flush()?;
    input.next_line().await
}

fn parse_pool_size(input: &str) -> Result<u32, RaffleError> {
    let size: i64 = input
        .parse()
        .map_err(|_| RaffleError::InvalidConfigValueError {
            field: "pool size".to_string(),
            value: input.to_string(),
            reason: "not a whole number".to_string(),
        })?;
    if size > i64::from(MAX_POOL_SIZE) {
        return Err(RaffleError::InvalidConfigValueError {
            field: "pool size".to_string(),
            value: input.to_string(),
            reason: format!("at most {} numbers are supported", MAX_POOL_SIZE),
        });
    }
    u32::try_from(size).map_err(|_| RaffleError::InvalidSize { size })
}

async fn reveal<K: KeyValueStore>(session: &mut DrawSession<K>) {
    let width = session
        .current_state()
        .total()
        .map(|total| total.to_string().len())
        .unwrap_or(1);

    while let Some(event) = session.next_event().await {
        match event {
            RevealEvent::Tick(decoy) => {
                print!("\r  🎲 {:>width$}", decoy, width = width);
                let _ = std::io::stdout().flush();
            }
            RevealEvent::Settled(value) => {
                println!("\r  🎉 {:>width$}", value, width = width);
                break;
            }
        }
    }

    if let Some(warning) = session.persistence_warning() {
        eprintln!("⚠️ Progress was not saved: {}", warning);
    }

    let state = session.current_state();
    println!(
        "     {} drawn, {} left",
        state.drawn().len(),
        state.remaining().len()
    );
    if let SessionState::Complete(done) = state {
        println!("🏁 All {} numbers have been drawn", done.pool().total());
        print_history(state);
    }
}

fn print_history(state: &SessionState) {
    let drawn: Vec<String> = state.drawn().iter().map(u32::to_string).collect();
    match state.total() {
        Some(total) if !drawn.is_empty() => {
            println!("📜 Drawn ({}/{}): {}", drawn.len(), total, drawn.join(", "))
        }
        Some(total) => println!("📜 Nothing drawn yet from 1 to {}", total),
        None => println!("📜 No session in progress"),
    }
}

fn report(e: &RaffleError) {
    tracing::debug!("{} (Category: {:?}, Severity: {:?})", e, e.category(), e.severity());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}

fn exit_code(e: &RaffleError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
