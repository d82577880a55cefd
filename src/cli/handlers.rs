use crate::audio::backend::AudioBackend;
use crate::audio::cpal_backend::CpalBackend;
use crate::audio::level::LevelCell;
use crate::audio::loopback::LoopbackMeter;
use crate::audio::{DeviceRole, DeviceSelection, StreamSpec};
use crate::cli::commands::*;
use crate::cli::select::prompt_device;
use crate::config;
use crate::display;
use crate::error::Result;
use crate::video::{Resolution, SUPPORTED_RESOLUTIONS};
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

pub async fn handle_command(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run {
            input,
            output,
            no_playback,
            select,
            seconds,
        } => {
            let options = RunOptions {
                input,
                output,
                no_playback,
                select,
                seconds,
            };
            handle_run(options, config_path).await
        }
        Commands::Devices { json } => handle_devices(json).await,
        Commands::Resolutions { check } => handle_resolutions(check).await,
        Commands::Config { action } => handle_config(action, config_path).await,
    }
}

struct RunOptions {
    input: Option<String>,
    output: Option<String>,
    no_playback: bool,
    select: bool,
    seconds: Option<u64>,
}

/// Devices the run loop asks the meter for
#[derive(Debug, Clone, PartialEq, Eq)]
struct RunSelection {
    input: Option<String>,
    output: Option<String>,
    playback: bool,
}

impl RunSelection {
    fn input(&self) -> DeviceSelection {
        DeviceSelection::from(self.input.clone())
    }

    fn output(&self) -> DeviceSelection {
        if self.playback {
            DeviceSelection::from(self.output.clone())
        } else {
            DeviceSelection::Disabled
        }
    }

    /// Ask for new devices. A cancelled prompt keeps the current choice.
    fn prompt(&mut self, backend: &CpalBackend) -> Result<()> {
        let inputs = backend.list_devices(DeviceRole::Input)?;
        if let Some(name) = prompt_device(DeviceRole::Input, &inputs, self.input.as_deref())? {
            self.input = Some(name);
        }

        if self.playback {
            let outputs = backend.list_devices(DeviceRole::Output)?;
            if let Some(name) = prompt_device(DeviceRole::Output, &outputs, self.output.as_deref())?
            {
                self.output = Some(name);
            }
        }
        Ok(())
    }
}

/// Point the meter at `selection`, reopening only the roles that changed
fn apply_selection<B: AudioBackend>(
    meter: &mut LoopbackMeter<B>,
    selection: &RunSelection,
) -> Result<()> {
    tracing::debug!(
        "Selecting input '{}', output '{}'",
        selection.input(),
        selection.output()
    );
    meter.configure(selection.input(), selection.output())
}

fn is_select_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("s")
}

/// Lines typed on stdin, read on a detached thread.
///
/// After each line the reader waits for `resume` before reading again, so
/// an interactive prompt never competes with it for input.
struct CommandLines {
    lines: mpsc::UnboundedReceiver<String>,
    resume: std::sync::mpsc::Sender<()>,
}

impl CommandLines {
    fn spawn() -> Self {
        let (line_tx, lines) = mpsc::unbounded_channel();
        let (resume, resume_rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        if line_tx.send(line.clone()).is_err() || resume_rx.recv().is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Stopped reading commands from stdin: {}", e);
                        break;
                    }
                }
            }
        });

        Self { lines, resume }
    }

    async fn next(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    fn resume(&self) {
        self.resume.send(()).ok();
    }
}

fn device_names<B: AudioBackend>(meter: &LoopbackMeter<B>) -> (String, String) {
    (
        meter.input_device_name().unwrap_or("(no input)").to_string(),
        meter.output_device_name().unwrap_or("(no playback)").to_string(),
    )
}

async fn handle_run(options: RunOptions, config_path: Option<&Path>) -> Result<()> {
    let cfg = config::loader::load_config_with_env(config_path)?;
    let backend = CpalBackend::new();
    let seconds = options.seconds;

    let mut selection = RunSelection {
        input: options.input.or(cfg.audio.input_device.clone()),
        output: options.output.or(cfg.audio.output_device.clone()),
        playback: cfg.audio.playback && !options.no_playback,
    };

    if options.select {
        selection.prompt(&backend)?;
    }

    let level = Arc::new(LevelCell::new());
    let mut meter = LoopbackMeter::new(
        backend,
        StreamSpec::default(),
        cfg.audio.queue_blocks,
        level.clone(),
    );

    // Open failures degrade the loopback instead of aborting it
    if let Err(e) = apply_selection(&mut meter, &selection) {
        eprintln!("Warning: {}", e);
    }
    meter.start()?;

    let (mut input_name, mut output_name) = device_names(&meter);
    let spec = *meter.spec();

    println!(
        "Loopback {} -> {} ({} Hz, {} ms blocks).",
        input_name,
        output_name,
        spec.sample_rate,
        spec.block_duration_ms()
    );
    println!("Type s and Enter to select devices, Ctrl+C to stop.");

    let width = cfg.meter.width;
    let mut ticker = tokio::time::interval(Duration::from_millis(cfg.meter.refresh_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let deadline = async move {
        match seconds {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut commands = CommandLines::spawn();
    let mut stdin_open = true;

    let mut stdout = std::io::stdout();
    let mut seen = 0;
    print!("\r{}", display::status_line(&input_name, &output_name, 0, width));
    stdout.flush().ok();

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = &mut deadline => break,
            line = commands.next(), if stdin_open => {
                let Some(line) = line else {
                    stdin_open = false;
                    continue;
                };

                if is_select_command(&line) {
                    println!();
                    // The prompt blocks; the meter is not redrawn meanwhile
                    let prompted =
                        tokio::task::block_in_place(|| selection.prompt(meter.backend()));
                    if let Err(e) = prompted.and_then(|_| apply_selection(&mut meter, &selection)) {
                        eprintln!("Warning: {}", e);
                    }
                    (input_name, output_name) = device_names(&meter);
                    println!("Loopback {} -> {}", input_name, output_name);
                    print!(
                        "\r{}",
                        display::status_line(&input_name, &output_name, level.latest(), width)
                    );
                    stdout.flush().ok();
                }
                commands.resume();
            }
            _ = ticker.tick() => {
                if let Some(current) = level.take_update(&mut seen) {
                    print!("\r{}", display::status_line(&input_name, &output_name, current, width));
                    stdout.flush().ok();
                }
            }
        }
    }
    println!();

    let stats = meter.queue_stats();
    meter.shutdown();

    println!("Metered {} blocks", level.snapshot().sequence);
    if let Some(stats) = stats {
        println!(
            "Playback: {} samples dropped, {} underruns",
            stats.overflows, stats.underruns
        );
    }
    Ok(())
}

async fn handle_devices(json: bool) -> Result<()> {
    let backend = CpalBackend::new();
    let inputs = backend.list_devices(DeviceRole::Input)?;
    let outputs = backend.list_devices(DeviceRole::Output)?;

    if json {
        let value = serde_json::json!({
            "input": inputs,
            "output": outputs,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for (title, devices) in [("Input Devices", &inputs), ("Output Devices", &outputs)] {
        println!("{}:", title);
        println!("{}", "-".repeat(50));
        if devices.is_empty() {
            println!("  (none)");
        }
        for device in devices {
            let marker = if device.is_default { "*" } else { " " };
            println!(
                "{} {} ({}Hz, {} ch)",
                marker, device.name, device.sample_rate, device.channels
            );
        }
        println!();
    }
    println!("* = default device");
    Ok(())
}

async fn handle_resolutions(check: Option<String>) -> Result<()> {
    if let Some(value) = check {
        let resolution: Resolution = value.parse()?;
        if resolution.is_supported() {
            println!("{} is supported", resolution);
        } else {
            println!("{} is not supported", resolution);
        }
        return Ok(());
    }

    println!("{:<6} {:<12}", "Index", "Resolution");
    println!("{}", "-".repeat(19));
    for (index, resolution) in SUPPORTED_RESOLUTIONS.iter().enumerate() {
        println!("{:<6} {:<12}", index, resolution);
    }
    Ok(())
}

async fn handle_config(action: ConfigCommands, config_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let cfg = config::loader::load_config_with_env(config_path)?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigCommands::Path => {
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => config::loader::config_path()?,
            };
            println!("{}", path.display());
        }
        ConfigCommands::Init => {
            let (cfg, path) = match config_path {
                Some(path) if path.exists() => {
                    (config::loader::load_config_from(path)?, path.to_path_buf())
                }
                Some(path) => {
                    let cfg = config::VuloopConfig::default();
                    config::loader::save_config_to(&cfg, path)?;
                    (cfg, path.to_path_buf())
                }
                None => (config::loader::load_config()?, config::loader::config_path()?),
            };
            println!("Configuration initialized at: {}", path.display());
            println!("\nSettings:");
            println!(
                "  Input device: {}",
                cfg.audio.input_device.as_deref().unwrap_or("default")
            );
            println!(
                "  Output device: {}",
                cfg.audio.output_device.as_deref().unwrap_or("default")
            );
            println!("  Playback: {}", cfg.audio.playback);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::fake::{Event, FakeBackend};
    use crate::error::VuloopError;

    fn selection(input: Option<&str>, output: Option<&str>, playback: bool) -> RunSelection {
        RunSelection {
            input: input.map(String::from),
            output: output.map(String::from),
            playback,
        }
    }

    fn meter(backend: &FakeBackend) -> LoopbackMeter<FakeBackend> {
        LoopbackMeter::new(
            backend.clone(),
            StreamSpec::default(),
            4,
            Arc::new(LevelCell::new()),
        )
    }

    #[test]
    fn test_selection_to_devices() {
        let sel = selection(None, Some("SpeakerB"), true);
        assert_eq!(sel.input(), DeviceSelection::Default);
        assert_eq!(sel.output(), DeviceSelection::Named("SpeakerB".to_string()));

        let sel = selection(Some("MicA"), Some("SpeakerB"), false);
        assert_eq!(sel.input(), DeviceSelection::Named("MicA".to_string()));
        assert_eq!(sel.output(), DeviceSelection::Disabled);
    }

    #[test]
    fn test_reselect_while_running_reopens_input_only() {
        let backend = FakeBackend::default();
        let mut meter = meter(&backend);
        let mut sel = selection(Some("MicA"), Some("SpeakerB"), true);
        apply_selection(&mut meter, &sel).unwrap();
        meter.start().unwrap();

        sel.input = Some("MicC".to_string());
        apply_selection(&mut meter, &sel).unwrap();

        assert_eq!(
            backend.events(),
            vec![
                Event::OpenInput("MicA".into()),
                Event::OpenOutput("SpeakerB".into()),
                Event::Play("SpeakerB".into()),
                Event::Play("MicA".into()),
                Event::CloseInput("MicA".into()),
                Event::OpenInput("MicC".into()),
                Event::Play("MicC".into()),
            ]
        );
        assert_eq!(
            device_names(&meter),
            ("MicC".to_string(), "SpeakerB".to_string())
        );
    }

    #[test]
    fn test_reselect_failure_keeps_other_role() {
        let backend = FakeBackend::failing(&["MicX"]);
        let mut meter = meter(&backend);
        let mut sel = selection(Some("MicA"), Some("SpeakerB"), true);
        apply_selection(&mut meter, &sel).unwrap();
        meter.start().unwrap();

        sel.input = Some("MicX".to_string());
        let err = apply_selection(&mut meter, &sel).unwrap_err();
        assert!(matches!(
            err,
            VuloopError::DeviceOpen {
                role: DeviceRole::Input,
                ..
            }
        ));
        assert_eq!(
            device_names(&meter),
            ("(no input)".to_string(), "SpeakerB".to_string())
        );
    }

    #[test]
    fn test_is_select_command() {
        assert!(is_select_command("s"));
        assert!(is_select_command(" S \n"));
        assert!(!is_select_command(""));
        assert!(!is_select_command("select"));
    }
}
