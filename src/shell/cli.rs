use crate::common::Error;

#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct ShellOptions {
    pub(super) help: bool,
    pub(super) verbose: bool,
    pub(super) no_prompt: bool,
}

type OptionSetter = fn(&mut ShellOptions);

struct ShellOption {
    short: char,
    long: &'static str,
    set: OptionSetter,
}

impl ShellOptions {
    const SHELL_OPTIONS: &'static [ShellOption] = &[
        ShellOption {
            short: 'h',
            long: "help",
            set: |options| options.help = true,
        },
        ShellOption {
            short: 'v',
            long: "verbose",
            set: |options| options.verbose = true,
        },
        ShellOption {
            short: 'p',
            long: "no-prompt",
            set: |options| options.no_prompt = true,
        },
    ];

    pub(super) fn from_env() -> Result<Self, Error> {
        Self::parse_arguments(std::env::args().skip(1))
    }

    /// Parse the command line arguments, not including the program name.
    /// Short options can be grouped behind a single dash.
    fn parse_arguments(arguments: impl Iterator<Item = String>) -> Result<Self, Error> {
        let mut options = Self::default();

        for argument in arguments {
            if let Some(long) = argument.strip_prefix("--") {
                let option = Self::SHELL_OPTIONS
                    .iter()
                    .find(|option| option.long == long)
                    .ok_or_else(|| Error::Options(format!("unrecognized option '{argument}'")))?;
                (option.set)(&mut options);
            } else if let Some(shorts) = argument.strip_prefix('-') {
                if shorts.is_empty() {
                    return Err(Error::Options(format!("unrecognized option '{argument}'")));
                }
                for short in shorts.chars() {
                    let option = Self::SHELL_OPTIONS
                        .iter()
                        .find(|option| option.short == short)
                        .ok_or_else(|| Error::Options(format!("invalid option -- '{short}'")))?;
                    (option.set)(&mut options);
                }
            } else {
                return Err(Error::Options(format!("unexpected argument '{argument}'")));
            }
        }

        Ok(options)
    }
}
