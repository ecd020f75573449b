pub(super) const USAGE_MSG: &str = "usage: jsh [-hvp]";

const DESCRIPTOR: &str = "jsh - a job-controlling shell";

const HELP_MSG: &str = "Options:
  -h, --help        display this help message and exit
  -v, --verbose     print a diagnostic on every job table change
  -p, --no-prompt   do not print a command prompt
";

pub(super) fn long_help_message() -> String {
    format!("{USAGE_MSG}\n\n{DESCRIPTOR}\n\n{HELP_MSG}")
}
