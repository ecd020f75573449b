//! Utilities to handle signals.
use libc::c_int;

mod handler;
mod info;
mod set;
mod stream;

pub(crate) use handler::{SignalHandler, SignalHandlerBehavior};
pub(crate) use info::SignalInfo;
pub(crate) use set::SignalSet;
pub(crate) use stream::{register_handlers, SignalStream};

pub(crate) type SignalNumber = c_int;

macro_rules! define_consts {
    ($($signal:ident,)*) => {
        pub(crate) mod consts {
            pub(crate) use libc::{$($signal,)*};
        }

        pub(crate) fn signal_name(signal: SignalNumber) -> &'static str {
            match signal {
                $(consts::$signal => stringify!($signal),)*
                _ => "unknown signal",
            }
        }
    };
}

define_consts! {
    SIGINT,
    SIGQUIT,
    SIGTSTP,
    SIGCHLD,
    SIGCONT,
    SIGTTIN,
    SIGTTOU,
    SIGKILL,
    SIGSTOP,
}

#[cfg(test)]
mod tests {
    use super::{consts::*, signal_name};

    #[test]
    fn names_of_known_signals() {
        assert_eq!(signal_name(SIGINT), "SIGINT");
        assert_eq!(signal_name(SIGTSTP), "SIGTSTP");
        assert_eq!(signal_name(SIGCHLD), "SIGCHLD");
        assert_eq!(signal_name(-1), "unknown signal");
    }
}
