//! The interactive command shell.

use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use processor::Processor;
use scheduler::Config;
use tracing::info;

use crate::report::{ProcessScreen, Report};

const PROMPT: &str = "root:\\> ";
const CLEAR: &str = "\x1b[2J\x1b[1;1H";

enum Flow {
    Continue,
    Exit,
}

/// Reads commands from `input` and drives a [`Processor`].
pub struct Shell<R, W> {
    input: R,
    output: W,
    processor: Processor,
    config_path: PathBuf,
    report_path: PathBuf,
    initialized: bool,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(input: R, output: W, config_path: PathBuf, report_path: PathBuf) -> Self {
        Shell {
            input,
            output,
            processor: Processor::new(),
            config_path,
            report_path,
            initialized: false,
        }
    }

    /// Runs until `exit` or the end of the input. The processor is stopped
    /// on the way out.
    pub fn run(&mut self) -> Result<()> {
        while let Some(line) = self.read_line()? {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            if let Flow::Exit = self.execute(&tokens)? {
                break;
            }
        }
        self.processor.stop();
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        write!(self.output, "{PROMPT}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn execute(&mut self, tokens: &[&str]) -> Result<Flow> {
        match tokens {
            ["exit", ..] => {
                writeln!(self.output, "exiting program...")?;
                return Ok(Flow::Exit);
            }
            ["initialize", ..] if !self.initialized => self.initialize()?,
            ["initialize", ..] => writeln!(self.output, "Already initialized.")?,
            _ if !self.initialized => writeln!(self.output, "Please initialize first!")?,
            ["screen"] => writeln!(self.output, "Missing argument after 'screen'")?,
            ["screen", "-s" | "-r"] => writeln!(self.output, "Missing argument: Process Name")?,
            ["screen", "-s", name, ..] => self.create_screen(name)?,
            ["screen", "-r", name, ..] => self.resume_screen(name)?,
            ["screen", "-ls", ..] => {
                write!(self.output, "{}", Report(&self.processor.snapshot()))?;
            }
            ["screen", ..] => writeln!(self.output, "Unknown screen option.")?,
            ["scheduler-start" | "scheduler-test", ..] if self.processor.is_synthetic_load_enabled() => {
                writeln!(self.output, "Test is already running.")?;
            }
            ["scheduler-start" | "scheduler-test", ..] => {
                self.processor.enable_synthetic_load();
                writeln!(self.output, "Test has started...")?;
            }
            ["scheduler-stop", ..] => {
                self.processor.disable_synthetic_load();
                writeln!(self.output, "Test has stopped.")?;
            }
            ["report-util", ..] => {
                let report = Report(&self.processor.snapshot()).to_string();
                fs::write(&self.report_path, report)
                    .with_context(|| format!("writing {}", self.report_path.display()))?;
                writeln!(self.output, "report file created at {}", self.report_path.display())?;
            }
            _ => writeln!(self.output, "Unknown command.")?,
        }
        Ok(Flow::Continue)
    }

    fn initialize(&mut self) -> Result<()> {
        writeln!(self.output, "initializing processor configuration...")?;

        let config = fs::read_to_string(&self.config_path)
            .with_context(|| format!("reading {}", self.config_path.display()))
            .and_then(|text| Ok(text.parse::<Config>()?));
        let config = match config {
            Ok(config) => config,
            Err(err) => {
                writeln!(self.output, "failed to load configuration: {err:#}")?;
                return Ok(());
            }
        };

        writeln!(self.output, "configuration loaded successfully.")?;
        writeln!(self.output)?;
        writeln!(self.output, "num-cpu: {}", config.num_cores)?;
        writeln!(self.output, "scheduler: {}", config.policy)?;
        writeln!(self.output, "quantum-cycles: {}", config.quantum)?;
        writeln!(self.output, "batch-process-freq: {}", config.batch_frequency)?;
        writeln!(self.output, "min-ins: {}", config.min_instructions)?;
        writeln!(self.output, "max-ins: {}", config.max_instructions)?;
        writeln!(self.output, "delay-per-exec: {}", config.instruction_delay.as_millis())?;
        writeln!(self.output)?;

        self.processor.configure(config)?;
        self.processor.start()?;
        self.initialized = true;
        info!(config = %self.config_path.display(), "shell initialized");
        writeln!(self.output, "scheduler started successfully.")?;
        Ok(())
    }

    fn create_screen(&mut self, name: &str) -> Result<()> {
        if self.processor.locate(name).is_some() {
            writeln!(self.output, "Process <{name}> already exists.")?;
            return Ok(());
        }
        let process = self.processor.create_process(Some(name));
        self.processor.admit(process);
        self.screen(name)
    }

    fn resume_screen(&mut self, name: &str) -> Result<()> {
        if self.processor.locate(name).is_none() {
            writeln!(self.output, "Process <{name}> not found.")?;
            return Ok(());
        }
        self.screen(name)
    }

    /// The per-process screen. Returns on `exit` or at the end of the input.
    fn screen(&mut self, name: &str) -> Result<()> {
        write!(self.output, "{CLEAR}")?;
        while let Some(line) = self.read_line()? {
            match line.split_whitespace().next() {
                Some("process-smi") => match self.processor.locate(name) {
                    Some(view) => {
                        writeln!(self.output)?;
                        write!(self.output, "{}", ProcessScreen(&view))?;
                        writeln!(self.output)?;
                    }
                    None => writeln!(self.output, "Process <{name}> not found.")?,
                },
                Some("exit") => {
                    writeln!(self.output, "Returning home...")?;
                    break;
                }
                Some(_) => writeln!(self.output, "Unknown command inside process screen.")?,
                None => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;

    fn run_script(script: &str, config: &Path, report: &Path) -> String {
        let mut output = Vec::new();
        let mut shell = Shell::new(
            Cursor::new(script.to_string()),
            &mut output,
            config.to_path_buf(),
            report.to_path_buf(),
        );
        shell.run().unwrap();
        drop(shell);
        String::from_utf8(output).unwrap()
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("runner-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn commands_need_initialize() {
        let missing = Path::new("/nonexistent/config.txt");
        let output = run_script("screen -ls\n\ninitialize\nexit\n", missing, missing);

        assert!(output.contains("Please initialize first!"));
        assert!(output.contains("failed to load configuration: reading /nonexistent/config.txt"));
        assert!(output.contains("exiting program..."));
    }

    #[test]
    fn invalid_config_is_reported() {
        let config = temp_file("invalid.txt", "num-cpu 0\n");
        let output = run_script("initialize\nexit\n", &config, &config);
        assert!(output.contains("failed to load configuration: num-cpu out of range: 0"));
        fs::remove_file(config).ok();
    }

    #[test]
    fn screen_session() {
        let config = temp_file(
            "session.txt",
            "num-cpu 1\nscheduler rr\nquantum-cycles 2\nbatch-process-freq 1\nmin-ins 3\nmax-ins 3\ndelay-per-exec 0\n",
        );
        let report = std::env::temp_dir().join(format!("runner-{}-report.txt", std::process::id()));
        let script = "\
initialize
initialize
screen
screen -s
screen -s alpha
process-smi
jump
exit
screen -s alpha
screen -r ghost
screen -r alpha
exit
report-util
scheduler-start
scheduler-test
scheduler-stop
bogus
exit
";
        let output = run_script(script, &config, &report);

        assert!(output.contains("scheduler: rr"));
        assert!(output.contains("scheduler started successfully."));
        assert!(output.contains("Already initialized."));
        assert!(output.contains("Missing argument after 'screen'"));
        assert!(output.contains("Missing argument: Process Name"));
        assert!(output.contains("Process name: alpha\nID: 1\n"));
        assert!(output.contains("Unknown command inside process screen."));
        assert!(output.contains("Returning home..."));
        assert!(output.contains("Process <alpha> already exists."));
        assert!(output.contains("Process <ghost> not found."));
        assert!(output.contains("Test has started..."));
        assert!(output.contains("Test is already running."));
        assert!(output.contains("Test has stopped."));
        assert!(output.contains("Unknown command."));

        let written = fs::read_to_string(&report).unwrap();
        assert!(written.starts_with("CPU utilization: "));
        fs::remove_file(config).ok();
        fs::remove_file(report).ok();
    }
}
