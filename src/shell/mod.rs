use std::io;
use std::process::exit;

use crate::common::Error;
use crate::cutils::was_interrupted;
use crate::exec::{spawn_job, SpawnRequest};
use crate::jobs::{JobState, JobTable, JobTableFull};
use crate::log::{dev_warn, user_error, ShellLogger};
use crate::system::poll::PollSet;
use crate::system::signal::consts::*;
use crate::system::signal::{
    register_handlers, SignalHandler, SignalHandlerBehavior, SignalSet, SignalStream,
};

use cli::ShellOptions;
use parse::CommandLine;

mod builtins;
mod cli;
mod help;
mod line_buffer;
mod parse;
mod relay;

use line_buffer::LineBuffer;

const PROMPT: &str = "jsh> ";

pub fn main() {
    ShellLogger::new("jsh: ").into_global_logger();

    let options = match ShellOptions::from_env() {
        Ok(options) => options,
        Err(error) => {
            if error.is_usage() {
                eprintln_ignore_io_error!("jsh: {error}\n{}", help::USAGE_MSG);
            } else {
                eprintln_ignore_io_error!("jsh: {error}");
            }
            exit(1);
        }
    };

    if options.help {
        println_ignore_io_error!("{}", help::long_help_message());
        exit(1);
    }

    if options.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    match run(&options) {
        Ok(()) => exit(0),
        Err(error) => {
            user_error!("{error}");
            exit(1);
        }
    }
}

fn run(options: &ShellOptions) -> Result<(), Error> {
    let signal_stream = SignalStream::init()?;
    let _handlers = register_handlers([SIGCHLD, SIGINT, SIGTSTP, SIGQUIT])?;
    // a shell running in the background must not stop on terminal access
    let _sigttin = SignalHandler::register(SIGTTIN, SignalHandlerBehavior::Ignore)?;
    let _sigttou = SignalHandler::register(SIGTTOU, SignalHandlerBehavior::Ignore)?;

    Shell {
        jobs: JobTable::new(),
        signal_stream,
        prompt: !options.no_prompt,
    }
    .run()
}

/// The events the read-eval loop can wake up on. Queued signals are handled
/// before new input so the job table is up to date when a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ReplEvent {
    Signal,
    Stdin,
}

pub(crate) struct Shell {
    jobs: JobTable,
    signal_stream: &'static SignalStream,
    prompt: bool,
}

impl Shell {
    /// The read-eval loop. Returns when standard input is exhausted; `quit`
    /// and a relayed `SIGQUIT` exit the process directly.
    fn run(mut self) -> Result<(), Error> {
        let stdin = io::stdin();

        let mut poll_set = PollSet::new();
        poll_set.add_fd_read(ReplEvent::Signal, self.signal_stream);
        poll_set.add_fd_read(ReplEvent::Stdin, &stdin);

        let mut buffer = LineBuffer::new();

        loop {
            if self.prompt {
                print_flush_ignore_io_error!("{PROMPT}");
            }

            loop {
                if let Some(line) = buffer.take_line() {
                    self.eval(&line);
                    break;
                }

                let events = match poll_set.poll() {
                    Ok(events) => events,
                    Err(err) if was_interrupted(&err) => continue,
                    Err(err) => return Err(err.into()),
                };

                for event in events {
                    match event {
                        ReplEvent::Signal => self.relay_signal(),
                        ReplEvent::Stdin => {
                            if buffer.fill()? == 0 {
                                // end of input; the last line may lack a newline
                                if let Some(line) = buffer.take_rest() {
                                    self.eval(&line);
                                }
                                return Ok(());
                            }
                        }
                    }
                }
            }
        }
    }

    fn eval(&mut self, line: &str) {
        let command = match CommandLine::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(err) => {
                user_error!("{err}");
                return;
            }
        };

        match builtins::dispatch(&mut self.jobs, &command.arguments) {
            builtins::Outcome::Handled => {}
            builtins::Outcome::WaitForeground(pid) => self.wait_foreground(pid),
            builtins::Outcome::NotBuiltin => self.launch(&command),
        }
    }

    /// Spawn an external command and register it as a job.
    ///
    /// The job control signals are blocked from before the fork until the
    /// child is registered in the table. Without that window a fast child
    /// could be reaped before the table knows its process id, and the
    /// notification would be lost.
    fn launch(&mut self, command: &CommandLine) {
        let request = SpawnRequest {
            program: &command.arguments[0],
            arguments: &command.arguments[1..],
            stdin: command.stdin_redirect.as_deref(),
            stdout: command.stdout_redirect.as_deref(),
        };

        let saved_mask = match SignalSet::job_control().and_then(|set| set.block()) {
            Ok(saved) => Some(saved),
            Err(err) => {
                dev_warn!("cannot block job control signals: {err}");
                None
            }
        };

        let state = if command.background {
            JobState::Background
        } else {
            JobState::Foreground
        };

        let spawned = spawn_job(request);

        let registered = match &spawned {
            Ok(pid) => match self.jobs.add(*pid, state, &command.text) {
                Ok(jid) => Some((jid, *pid)),
                Err(JobTableFull) => {
                    println_ignore_io_error!("Tried to create too many jobs");
                    None
                }
            },
            Err(_) => None,
        };

        if let Some(mask) = saved_mask {
            if let Err(err) = mask.set_mask() {
                dev_warn!("cannot restore signal mask: {err}");
            }
        }

        match spawned {
            Err(err) => user_error!("{}: {err}", command.arguments[0]),
            Ok(_) => {
                if let Some((jid, pid)) = registered {
                    if command.background {
                        println_ignore_io_error!("[{jid}] ({pid}) {}", command.text);
                    } else {
                        self.wait_foreground(pid);
                    }
                }
            }
        }
    }
}
