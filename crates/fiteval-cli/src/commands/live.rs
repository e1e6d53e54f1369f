//! The `fiteval live` command: run one category's battery from the terminal.
//!
//! Timed exercises start and stop on Enter while a [`Ticker`] drives the
//! session clock. Measured values are typed in. `q` cancels.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use fiteval_core::catalog::Measurement;
use fiteval_core::model::Category;
use fiteval_core::error::SessionError;
use fiteval_core::session::{Progress, SessionState, TestSession};
use fiteval_core::ticker::Ticker;
use fiteval_sinks::load_config_from;

pub async fn execute(
    category: String,
    rubrics: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let category: Category = category.parse().map_err(anyhow::Error::msg)?;
    let config = load_config_from(config_path.as_deref())?;
    let catalog = super::load_catalog(&config, rubrics.as_deref())?;

    let (mut session, completion) = TestSession::new(&catalog, category)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker: Option<Ticker> = None;
    let mut announced = None;

    println!("{category} test. Enter 'q' to cancel.");
    prompt(&mut session, &mut announced)?;

    while !session.state().is_terminal() {
        tokio::select! {
            Some(()) = next_tick(&mut ticker) => {
                let elapsed = session.tick()?;
                if elapsed.subsec_millis() == 0 {
                    eprint!("\r  {}s", elapsed.as_secs());
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    session.cancel()?;
                    break;
                };
                let line = line.trim();
                if line.eq_ignore_ascii_case("q") {
                    session.cancel()?;
                    break;
                }
                let outcome = match session.state() {
                    SessionState::Idle => session.start(),
                    SessionState::Running => session.stop(),
                    SessionState::AwaitingInput => session.submit_input(line),
                    SessionState::Scored | SessionState::Cancelled => break,
                };
                match outcome {
                    Ok(progress) => {
                        if session.state() != SessionState::Running {
                            ticker = None;
                        } else if ticker.is_none() {
                            ticker = session.current_exercise().map(|e| Ticker::spawn(e.tick));
                        }
                        if matches!(progress, Progress::Next(_) | Progress::Completed(_)) {
                            if let Some(o) = session.outcomes().last() {
                                println!("  {}: {:.2} -> {}/10", o.exercise_id, o.measured, o.score);
                            }
                        }
                        prompt(&mut session, &mut announced)?;
                    }
                    Err(e @ (SessionError::TooEarly { .. } | SessionError::Input(_))) => {
                        println!("{e}");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    match completion.wait().await {
        Some(result) => println!("{category} score: {}", result.score()),
        None => println!("Cancelled, nothing recorded."),
    }
    Ok(())
}

async fn next_tick(ticker: &mut Option<Ticker>) -> Option<()> {
    match ticker {
        Some(t) => t.next().await,
        None => std::future::pending().await,
    }
}

/// Print what the session is waiting for, announcing each exercise once.
/// Manual exercises need no start signal, so they are started here.
fn prompt(session: &mut TestSession, announced: &mut Option<usize>) -> Result<()> {
    let (index, total) = session.position();
    let Some(exercise) = session.current_exercise() else {
        return Ok(());
    };
    if *announced != Some(index) {
        println!("\n[{}/{}] {}", index + 1, total, exercise.name);
        println!("  {}", exercise.instructions);
        *announced = Some(index);
    }
    let timed = exercise.measurement.is_timed();
    let unit = match exercise.measurement {
        Measurement::Manual { input } | Measurement::TimedDistance { input, .. } => {
            format!(" ({})", input.unit)
        }
        Measurement::Timed => String::new(),
    };

    match session.state() {
        SessionState::Idle if timed => println!("  Press Enter to start."),
        SessionState::Idle => {
            session.start()?;
            return prompt(session, announced);
        }
        SessionState::Running => println!("  Running. Press Enter to stop."),
        SessionState::AwaitingInput => {
            print!("  Enter measurement{unit}: ");
            std::io::stdout().flush()?;
        }
        SessionState::Scored | SessionState::Cancelled => {}
    }
    Ok(())
}
