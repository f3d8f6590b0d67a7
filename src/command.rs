//! Xenax commands.
//!
//! A command is a short ASCII mnemonic, optionally followed by an integer
//! argument (e.g., `SP100000`, `G5000`, `TP`). Commands that take no argument
//! are available as constants, those that do are built with the functions of
//! the same name.
//!
//! ```
//! # use xenax::command;
//! assert_eq!(command::TELL_POSITION.to_string(), "TP");
//! assert_eq!(command::set_speed(100_000).to_string(), "SP100000");
//! ```

use std::fmt;

/// Define the constants and constructors for all the Xenax commands.
///
/// Each command defined as a brace-enclosed (`{...}`) item, which each contains:
///
/// 1. the command's mnemonic, as sent on the wire
/// 2. the name of the command as space-separated idents (dashes are not permitted)
/// 3. an optional `TakesData`, indicating the mnemonic must be followed by an
///    integer argument. A constructor function is generated for these commands
///    and a constant for all others.
macro_rules! define_commands {
    // Main entry case.
    // It's main purpose is to take the words in the name and concatenate them
    // before generating the items for each command.
    (
        $(
            {
                $mnemonic:literal,
                $($name_word:ident)+
                $(, $takes_data:ident)?
            }
        ),+
        $(,)?
    ) => {
        paste::paste! {
            define_commands!{@main
                $({
                    $mnemonic,
                    $($name_word)+,
                    [< $($name_word:camel)+ >]
                    $(, $takes_data)?
                }),+
            }
        }
    };

    (@main
        $(
            {
                $mnemonic:literal,
                $($name_word:ident)+,
                $name:ident
                $(, $takes_data:ident)?
            }
        ),+
    ) => {
        $(
            define_commands!{ @item $mnemonic, $($name_word)+, $name $(, $takes_data)? }
        )+
    };

    // Define the constant for a command without an argument.
    (@item $mnemonic:literal, $($name_word:ident)+, $name:ident) => {
        paste::paste! {
            #[doc = "The" $(" " $name_word)+ " (`" $mnemonic "`) command."]
            pub const [< $name:snake:upper >]: Command = Command::new($mnemonic);
        }
    };
    // Define the constructor for a command that takes an argument.
    (@item $mnemonic:literal, $($name_word:ident)+, $name:ident, TakesData) => {
        paste::paste! {
            #[doc = "The" $(" " $name_word)+ " (`" $mnemonic "<value>`) command."]
            pub const fn [< $name:snake >](value: i64) -> Command {
                Command::new($mnemonic).with_argument(value)
            }
        }
    };
}

define_commands! {
    { "ECH0", echo off },
    { "PW", power on },
    { "PQ", power off },
    { "EVT1", events on },
    { "EVT0", events off },
    { "HORM", home },
    { "TP", tell position },
    { "JP", jog positive },
    { "JN", jog negative },
    { "SP", set speed, TakesData },
    { "AC", set acceleration, TakesData },
    { "G", go to, TakesData },
}

/// The commands sent, in order, to prepare a freshly connected controller.
///
/// Homing must happen while events are enabled and finish before they are
/// disabled again.
pub const INITIALIZATION: [Command; 5] = [ECHO_OFF, POWER_ON, EVENTS_ON, HOME, EVENTS_OFF];

/// A command for a Xenax controller.
///
/// The [`Display`](fmt::Display) implementation produces the command's wire
/// text, without the terminating carriage return.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    /// The mnemonic, e.g., `SP`.
    mnemonic: &'static str,
    /// The argument appended to the mnemonic, if any.
    argument: Option<i64>,
}

impl Command {
    /// Create a command with the given mnemonic and no argument.
    pub const fn new(mnemonic: &'static str) -> Self {
        Command {
            mnemonic,
            argument: None,
        }
    }

    /// Return this command with `value` as its argument.
    pub const fn with_argument(self, value: i64) -> Self {
        Command {
            mnemonic: self.mnemonic,
            argument: Some(value),
        }
    }

    /// The command's mnemonic.
    pub const fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    /// The command's argument, if any.
    pub const fn argument(&self) -> Option<i64> {
        self.argument
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic)?;
        if let Some(argument) = self.argument {
            write!(f, "{argument}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wire_text() {
        assert_eq!(ECHO_OFF.to_string(), "ECH0");
        assert_eq!(POWER_ON.to_string(), "PW");
        assert_eq!(POWER_OFF.to_string(), "PQ");
        assert_eq!(EVENTS_ON.to_string(), "EVT1");
        assert_eq!(EVENTS_OFF.to_string(), "EVT0");
        assert_eq!(HOME.to_string(), "HORM");
        assert_eq!(TELL_POSITION.to_string(), "TP");
        assert_eq!(JOG_POSITIVE.to_string(), "JP");
        assert_eq!(JOG_NEGATIVE.to_string(), "JN");
        assert_eq!(set_speed(50).to_string(), "SP50");
        assert_eq!(set_acceleration(1_000_000).to_string(), "AC1000000");
        assert_eq!(go_to(5000).to_string(), "G5000");
        assert_eq!(go_to(-1).to_string(), "G-1");
    }

    #[test]
    fn initialization_order() {
        let sequence: Vec<String> = INITIALIZATION.iter().map(ToString::to_string).collect();
        assert_eq!(sequence, ["ECH0", "PW", "EVT1", "HORM", "EVT0"]);
    }

    #[test]
    fn argument_accessors() {
        let command = set_speed(1234);
        assert_eq!(command.mnemonic(), "SP");
        assert_eq!(command.argument(), Some(1234));
        assert_eq!(TELL_POSITION.argument(), None);
    }
}
