//! Screen Lock - Action taken when a session is blocked

use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("no lock command for this platform, configure one")]
    Unsupported,

    #[error("empty lock command")]
    EmptyCommand,

    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },
}

pub trait ScreenLocker: Send + Sync {
    fn lock(&self) -> Result<(), LockError>;
}

// ============================================================================
// COMMAND LOCKER
// ============================================================================

/// Runs an external command to lock the workstation
#[derive(Debug, Clone)]
pub struct CommandLocker {
    program: String,
    args: Vec<String>,
}

impl CommandLocker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line
    pub fn from_command_line(line: &str) -> Result<Self, LockError> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(LockError::EmptyCommand)?;
        Ok(Self::new(program, parts.collect()))
    }

    /// Configured override, or the platform's own lock command
    pub fn from_config(command: Option<&str>) -> Result<Self, LockError> {
        match command {
            Some(line) => Self::from_command_line(line),
            None => Self::platform_default(),
        }
    }

    #[cfg(target_os = "windows")]
    pub fn platform_default() -> Result<Self, LockError> {
        Ok(Self::new("rundll32.exe", vec!["user32.dll,LockWorkStation".to_string()]))
    }

    #[cfg(target_os = "linux")]
    pub fn platform_default() -> Result<Self, LockError> {
        Ok(Self::new("loginctl", vec!["lock-session".to_string()]))
    }

    #[cfg(target_os = "macos")]
    pub fn platform_default() -> Result<Self, LockError> {
        Ok(Self::new(
            "/System/Library/CoreServices/Menu Extras/User.menu/Contents/Resources/CGSession",
            vec!["-suspend".to_string()],
        ))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    pub fn platform_default() -> Result<Self, LockError> {
        Err(LockError::Unsupported)
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ScreenLocker for CommandLocker {
    fn lock(&self) -> Result<(), LockError> {
        log::info!("Locking screen: {} {}", self.program, self.args.join(" "));

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| LockError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(LockError::CommandFailed {
                command: self.program.clone(),
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

// ============================================================================
// NOOP LOCKER
// ============================================================================

/// Logs instead of locking (replays, dry runs)
#[derive(Debug, Default)]
pub struct NoopLocker {
    locks: AtomicUsize,
}

impl NoopLocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_count(&self) -> usize {
        self.locks.load(Ordering::Relaxed)
    }
}

impl ScreenLocker for NoopLocker {
    fn lock(&self) -> Result<(), LockError> {
        self.locks.fetch_add(1, Ordering::Relaxed);
        log::warn!("Screen lock requested (dry run, not locking)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_parsing() {
        let locker = CommandLocker::from_command_line("xdg-screensaver  lock").unwrap();
        assert_eq!(locker.program(), "xdg-screensaver");
        assert_eq!(locker.args, vec!["lock".to_string()]);

        assert!(matches!(
            CommandLocker::from_command_line("   "),
            Err(LockError::EmptyCommand)
        ));
    }

    #[test]
    fn test_override_wins_over_platform_default() {
        let locker = CommandLocker::from_config(Some("my-locker --now")).unwrap();
        assert_eq!(locker.program(), "my-locker");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_exit_status() {
        assert!(CommandLocker::new("true", vec![]).lock().is_ok());
        assert!(matches!(
            CommandLocker::new("false", vec![]).lock(),
            Err(LockError::CommandFailed { .. })
        ));
        assert!(matches!(
            CommandLocker::new("/nonexistent/mmouse-locker", vec![]).lock(),
            Err(LockError::Spawn { .. })
        ));
    }

    #[test]
    fn test_noop_locker_counts() {
        let locker = NoopLocker::new();
        locker.lock().unwrap();
        locker.lock().unwrap();
        assert_eq!(locker.lock_count(), 2);
    }
}
