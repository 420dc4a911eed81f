//! Developer console.

use std::fmt;
use std::sync::{Arc, Mutex};

use super::value::JsValue;
use crate::capability::CapabilitySlot;
use crate::sync::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Error,
    Warn,
}

impl ConsoleLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
        }
    }
}

/// One console method (`console.error`, `console.warn`).
pub trait ConsoleMethod: Send + Sync {
    fn call(&self, args: &[JsValue]);
}

impl<F> ConsoleMethod for F
where
    F: Fn(&[JsValue]) + Send + Sync,
{
    fn call(&self, args: &[JsValue]) {
        self(args)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleLine {
    pub level: ConsoleLevel,
    pub text: String,
}

/// Default console output: lines are kept for inspection and mirrored to
/// tracing at debug level.
#[derive(Debug, Default)]
pub struct DevConsole {
    lines: Mutex<Vec<ConsoleLine>>,
}

impl DevConsole {
    pub fn lines(&self) -> Vec<ConsoleLine> {
        lock(&self.lines).clone()
    }

    fn write(&self, level: ConsoleLevel, args: &[JsValue]) {
        let text = args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(" ");
        tracing::debug!(target: "scry::console", level = level.as_str(), "{}", text);
        lock(&self.lines).push(ConsoleLine { level, text });
    }
}

struct DevConsoleMethod {
    console: Arc<DevConsole>,
    level: ConsoleLevel,
}

impl ConsoleMethod for DevConsoleMethod {
    fn call(&self, args: &[JsValue]) {
        self.console.write(self.level, args);
    }
}

pub struct Console {
    pub error: Arc<CapabilitySlot<dyn ConsoleMethod>>,
    pub warn: Arc<CapabilitySlot<dyn ConsoleMethod>>,
    output: Arc<DevConsole>,
}

impl Default for Console {
    fn default() -> Self {
        let output = Arc::new(DevConsole::default());
        let method = |level: ConsoleLevel| -> Arc<CapabilitySlot<dyn ConsoleMethod>> {
            let initial: Arc<dyn ConsoleMethod> = Arc::new(DevConsoleMethod {
                console: output.clone(),
                level,
            });
            Arc::new(CapabilitySlot::new(initial))
        };
        Self {
            error: method(ConsoleLevel::Error),
            warn: method(ConsoleLevel::Warn),
            output,
        }
    }
}

impl Console {
    pub fn slot(&self, level: ConsoleLevel) -> &Arc<CapabilitySlot<dyn ConsoleMethod>> {
        match level {
            ConsoleLevel::Error => &self.error,
            ConsoleLevel::Warn => &self.warn,
        }
    }

    /// `console.error(...args)` through whatever is installed.
    pub fn error(&self, args: &[JsValue]) {
        self.error.current().call(args);
    }

    /// `console.warn(...args)` through whatever is installed.
    pub fn warn(&self, args: &[JsValue]) {
        self.warn.current().call(args);
    }

    /// Lines that reached the default output.
    pub fn output(&self) -> Vec<ConsoleLine> {
        self.output.lines()
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console").field("output", &self.output).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_console_records_lines() {
        let console = Console::default();
        console.error(&[JsValue::from("failed"), JsValue::from(3.0)]);
        console.warn(&[JsValue::from("careful")]);

        assert_eq!(
            console.output(),
            vec![
                ConsoleLine { level: ConsoleLevel::Error, text: "failed 3".to_string() },
                ConsoleLine { level: ConsoleLevel::Warn, text: "careful".to_string() },
            ]
        );
    }

    #[test]
    fn test_closure_console_method() {
        let console = Console::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        console.warn.replace(Arc::new(move |args: &[JsValue]| {
            lock(&sink).push(args.len());
        }));
        console.warn(&[JsValue::Null, JsValue::Undefined]);
        assert_eq!(*lock(&seen), vec![2]);
        assert!(console.output().is_empty());
    }
}
