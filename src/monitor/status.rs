//! Status indicator and the fail-stop halt

use std::thread;
use std::time::Duration;

/// Blink period while halted
pub const HALT_BLINK_PERIOD: Duration = Duration::from_millis(250);

/// On/off diagnostic signal
///
/// Purely advisory. Nothing in the data path reads it back.
pub trait StatusIndicator: Send {
    fn set(&mut self, on: bool);

    /// Brief on-off blip
    fn pulse(&mut self) {
        self.set(true);
        self.set(false);
    }
}

/// Indicator rendered as trace-level log lines
#[derive(Debug, Default)]
pub struct LogIndicator {
    on: bool,
}

impl LogIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl StatusIndicator for LogIndicator {
    fn set(&mut self, on: bool) {
        if on != self.on {
            tracing::trace!(target: "status", "indicator {}", if on { "on" } else { "off" });
        }
        self.on = on;
    }

    fn pulse(&mut self) {
        tracing::trace!(target: "status", "pulse");
        self.on = false;
    }
}

/// Halt forever, blinking the indicator
///
/// Entered only when the output device cannot be initialized; recovery
/// needs an external restart.
pub fn fail_stop(indicator: &mut dyn StatusIndicator, reason: &dyn std::fmt::Display) -> ! {
    tracing::error!("Fatal: {}. Halting until restarted.", reason);
    let mut on = false;
    loop {
        on = !on;
        indicator.set(on);
        thread::sleep(HALT_BLINK_PERIOD);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Transitions(Vec<bool>);

    impl StatusIndicator for Transitions {
        fn set(&mut self, on: bool) {
            self.0.push(on);
        }
    }

    #[test]
    fn test_default_pulse_is_on_then_off() {
        let mut indicator = Transitions::default();
        indicator.pulse();
        assert_eq!(indicator.0, vec![true, false]);
    }

    #[test]
    fn test_log_indicator_ends_pulse_off() {
        let mut indicator = LogIndicator::new();
        indicator.set(true);
        assert!(indicator.is_on());
        indicator.pulse();
        assert!(!indicator.is_on());
    }
}
