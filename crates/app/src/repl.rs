use std::{rc::Rc, time::Instant};

use breath_pacer_core::{AppConfig, Result, SessionController, Timer, WallTimer};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::console::{ConsoleAudio, ConsoleSurface};

/// One line typed at the interactive prompt.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true)]
pub struct ReplLine {
    #[command(subcommand)]
    pub command: ReplCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ReplCommand {
    Start,
    Stop,
    Toggle,
    /// Switch technique; stops the running session.
    Technique { id: String },
    /// Cue volume between 0 and 1.
    Volume { level: f32 },
    /// Background sound volume between 0 and 1.
    BackgroundVolume { level: f32 },
    Mute { state: Switch },
    /// Select a background sound.
    Sound { name: String },
    Status,
    #[command(alias = "exit")]
    Quit,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn parse_line(line: &str) -> std::result::Result<ReplCommand, clap::Error> {
    ReplLine::try_parse_from(line.split_whitespace()).map(|parsed| parsed.command)
}

/// Applies one prompt command to the session.
pub fn apply_command<T: Timer>(
    controller: &mut SessionController<T>,
    command: ReplCommand,
) -> Result<Flow> {
    match command {
        ReplCommand::Start => controller.on_start_clicked(),
        ReplCommand::Stop => controller.on_stop_clicked(),
        ReplCommand::Toggle => controller.on_toggle_clicked(),
        ReplCommand::Technique { id } => {
            if !controller.scheduler().catalog().contains(&id) {
                println!("unknown technique `{id}`, using the default");
            }
            controller.on_technique_changed(&id);
        }
        ReplCommand::Volume { level } => controller.change_volume(level)?,
        ReplCommand::BackgroundVolume { level } => controller.change_background_volume(level)?,
        ReplCommand::Mute { state } => controller.toggle_mute(state == Switch::On)?,
        ReplCommand::Sound { name } => controller.select_background(&name),
        ReplCommand::Status => {
            let levels = controller.settings().snapshot()?;
            println!(
                "technique={} running={} label={:?} cue_volume={} muted={} background={:?}",
                controller.scheduler().technique().id,
                controller.is_running(),
                controller.displayed_label(),
                levels.cue_volume,
                levels.cue_muted,
                controller.background_sound(),
            );
        }
        ReplCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Runs an interactive session until `quit` or end of input. The only timer
/// the loop waits on is the scheduler's single armed phase timer.
pub async fn run_interactive(config: &AppConfig, technique: Option<&str>) -> Result<()> {
    let mut controller = SessionController::new(
        config,
        WallTimer::new(),
        Rc::new(ConsoleAudio),
        Rc::new(ConsoleSurface { echo_labels: true }),
    )?;
    if let Some(id) = technique {
        controller.on_technique_changed(id);
    }

    drive(&mut controller, BufReader::new(tokio::io::stdin())).await
}

/// Feeds prompt lines from `input` into the session while delivering phase
/// timers as they fall due. The session is stopped on the way out.
pub async fn drive<R>(controller: &mut SessionController<WallTimer>, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let deadline = controller.next_deadline();
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                        println!("ignoring input that is not valid UTF-8");
                        continue;
                    }
                    Err(err) => {
                        controller.on_stop_clicked();
                        return Err(err.into());
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_line(&line) {
                    Ok(command) => {
                        if apply_command(controller, command)? == Flow::Quit {
                            break;
                        }
                    }
                    Err(err) => println!("{err}"),
                }
            }
            _ = sleep_until_deadline(deadline) => controller.poll(Instant::now()),
        }
    }

    controller.on_stop_clicked();
    Ok(())
}

/// Sleeps until `deadline`, or forever when nothing is armed.
pub async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use breath_pacer_core::ManualTimer;

    use super::*;

    fn controller() -> SessionController<ManualTimer> {
        SessionController::new(
            &AppConfig::default(),
            ManualTimer::new(),
            Rc::new(ConsoleAudio),
            Rc::new(ConsoleSurface::default()),
        )
        .unwrap()
    }

    #[test]
    fn parses_prompt_commands() {
        assert_eq!(parse_line("start").unwrap(), ReplCommand::Start);
        assert_eq!(
            parse_line("technique 478").unwrap(),
            ReplCommand::Technique {
                id: "478".to_string()
            }
        );
        assert_eq!(
            parse_line("background-volume 0.3").unwrap(),
            ReplCommand::BackgroundVolume { level: 0.3 }
        );
        assert_eq!(
            parse_line("mute on").unwrap(),
            ReplCommand::Mute { state: Switch::On }
        );
        assert_eq!(parse_line("exit").unwrap(), ReplCommand::Quit);
        assert!(parse_line("volume loud").is_err());
        assert!(parse_line("dance").is_err());
    }

    #[test]
    fn commands_drive_the_session() {
        let mut controller = controller();

        apply_command(&mut controller, ReplCommand::Start).unwrap();
        assert!(controller.is_running());
        controller.advance(Duration::from_secs(4));
        assert_eq!(controller.displayed_label(), "Hold");

        apply_command(
            &mut controller,
            ReplCommand::Technique {
                id: "resonant".to_string(),
            },
        )
        .unwrap();
        assert!(!controller.is_running());
        assert_eq!(controller.scheduler().technique().phases, vec![6000, 6000]);

        apply_command(&mut controller, ReplCommand::Mute { state: Switch::On }).unwrap();
        assert!(controller.settings().snapshot().unwrap().cue_muted);

        let flow = apply_command(&mut controller, ReplCommand::Quit).unwrap();
        assert_eq!(flow, Flow::Quit);
    }

    #[tokio::test]
    async fn invalid_utf8_lines_are_skipped() {
        let mut controller = SessionController::new(
            &AppConfig::default(),
            WallTimer::new(),
            Rc::new(ConsoleAudio),
            Rc::new(ConsoleSurface::default()),
        )
        .unwrap();
        let input: &[u8] = b"start\n\xff\xfe\ntechnique resonant\nstart\nquit\n";

        drive(&mut controller, input).await.unwrap();

        assert_eq!(controller.scheduler().technique().id, "resonant");
        assert!(!controller.is_running());
        assert!(controller.next_deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_loop_waits_without_a_deadline() {
        let idle = tokio::time::timeout(Duration::from_secs(60), sleep_until_deadline(None)).await;
        assert!(idle.is_err());

        let due = tokio::time::timeout(
            Duration::from_secs(60),
            sleep_until_deadline(Some(Instant::now())),
        )
        .await;
        assert!(due.is_ok());
    }
}
