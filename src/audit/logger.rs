use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::Utc;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Append-only record of every gate decision
#[derive(Debug, Clone)]
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create a new AuditLogger with the default log path
    pub fn new() -> std::io::Result<Self> {
        Self::with_path(Self::default_log_path()?)
    }

    /// Create an AuditLogger with a custom log path
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        // Ensure directory exists
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    /// Get the default log path: ~/.config/gcp-readonly/audit.log
    pub fn default_log_path() -> std::io::Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME environment variable not set"
            ))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gcp-readonly")
            .join("audit.log"))
    }

    /// Log an approved command and how it exited
    pub fn log_command(
        &self,
        command: &str,
        identity: &str,
        exit_code: Option<i32>,
    ) -> std::io::Result<()> {
        let exit = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
        self.append(&format!(
            "[{}] [{}] [EXECUTED] [exit:{}] {}",
            Utc::now().to_rfc3339(),
            identity.escape_debug(),
            exit,
            command.escape_debug()
        ))
    }

    /// Log a rejected command for forensics
    ///
    /// Repeated rejections from the same caller are the first sign of an
    /// agent probing for a way around the gate. `command` and `reason` carry
    /// caller text and are written as quoted, escaped strings so they stay
    /// on one line.
    pub fn log_rejection(&self, command: &str, step: &str, reason: &str) -> std::io::Result<()> {
        self.append(&format!(
            "[{}] [REJECTED] [step:{}] command={:?} reason={:?}",
            Utc::now().to_rfc3339(),
            step,
            command,
            reason
        ))
    }

    fn append(&self, entry: &str) -> std::io::Result<()> {
        // Check and rotate log if needed
        self.rotate_if_needed()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        // One write per entry keeps concurrent appends line-atomic
        file.write_all(format!("{}\n", entry).as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Rotate log file if it exceeds MAX_LOG_SIZE
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_path)?;
        if metadata.len() > MAX_LOG_SIZE {
            // Rotate: audit.log -> audit.log.1
            let backup_path = self.log_path.with_extension("log.1");
            fs::rename(&self.log_path, backup_path)?;
        }

        Ok(())
    }

    /// Get the path to the log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
