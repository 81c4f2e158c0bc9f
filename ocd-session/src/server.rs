use std::fs::OpenOptions;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::OcdError;

/// How long [`OcdServer::stop`] waits for a graceful exit before killing the process.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Everything needed to launch an OpenOCD server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Path to the `openocd` executable.
    pub executable: String,
    /// Interface configuration file, relative to the scripts directory.
    pub interface_cfg: String,
    /// Target configuration file, relative to the scripts directory.
    pub target_cfg: String,
    /// OpenOCD scripts directory, passed with `-s` when set.
    pub scripts_dir: Option<String>,
    /// Additional arguments, split on whitespace.
    pub extra_args: String,
    /// Time the server gets to initialize before it is checked for an early exit.
    pub startup_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            executable: "openocd".to_string(),
            interface_cfg: "interface/cmsis-dap.cfg".to_string(),
            target_cfg: "target/traveo2_1m_a0.cfg".to_string(),
            scripts_dir: None,
            extra_args: String::new(),
            startup_delay: Duration::from_secs(2),
        }
    }
}

impl ServerConfig {
    /// The command line arguments, in the order OpenOCD evaluates them.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(dir) = self.scripts_dir.as_deref().filter(|dir| !dir.is_empty()) {
            args.extend(["-s".to_string(), dir.to_string()]);
        }

        args.extend([
            "-f".to_string(),
            self.interface_cfg.clone(),
            "-f".to_string(),
            self.target_cfg.clone(),
        ]);
        args.extend(self.extra_args.split_whitespace().map(str::to_string));

        args
    }
}

/// A running OpenOCD process.
///
/// Standard output and standard error are appended to one temporary file, so the server can
/// never stall on a full pipe.
#[derive(Debug)]
pub struct OcdServer {
    child: Child,
    output: tempfile::NamedTempFile,
}

impl OcdServer {
    /// Launches the server and waits out the startup delay.
    ///
    /// Fails with [`OcdError::Startup`] if the process is gone by then.
    pub fn start(config: &ServerConfig) -> Result<Self, OcdError> {
        let args = config.args();
        tracing::info!("Starting OpenOCD: {} {}", config.executable, args.join(" "));

        let spawn_error = |source| OcdError::Spawn {
            executable: config.executable.clone(),
            source,
        };

        let output = tempfile::Builder::new()
            .prefix("openocd-")
            .suffix(".log")
            .tempfile()
            .map_err(spawn_error)?;
        let stdout = OpenOptions::new()
            .append(true)
            .open(output.path())
            .map_err(spawn_error)?;
        let stderr = stdout.try_clone().map_err(spawn_error)?;

        let child = Command::new(&config.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(spawn_error)?;

        let mut server = Self { child, output };

        std::thread::sleep(config.startup_delay);

        if let Some(status) = server.child.try_wait()? {
            let output = server.output()?;
            tracing::error!("OpenOCD exited during startup with {status}");
            return Err(OcdError::Startup { status, output });
        }

        tracing::info!("OpenOCD is running with pid {}", server.child.id());
        Ok(server)
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Checks whether the process is still alive.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Everything the server has written so far.
    pub fn output(&self) -> Result<String, OcdError> {
        let bytes = std::fs::read(self.output.path())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Asks the server to terminate, and kills it if it is still alive after [`STOP_TIMEOUT`].
    ///
    /// The captured output stays readable until the server is dropped.
    pub fn stop(&mut self) -> Result<Option<ExitStatus>, OcdError> {
        if let Some(status) = self.child.try_wait()? {
            tracing::debug!("OpenOCD had already exited with {status}");
            return Ok(Some(status));
        }

        tracing::info!("Stopping OpenOCD (pid {})", self.child.id());
        self.terminate()?;

        let deadline = Instant::now() + STOP_TIMEOUT;
        while Instant::now() < deadline {
            if let Some(status) = self.child.try_wait()? {
                return Ok(Some(status));
            }
            std::thread::sleep(STOP_POLL_INTERVAL);
        }

        tracing::warn!(
            "OpenOCD did not exit within {:?}, killing it",
            STOP_TIMEOUT
        );
        self.child.kill()?;
        self.child.wait().map(Some).map_err(OcdError::from)
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> Result<(), OcdError> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let pid = i32::try_from(self.child.id())
            .map_err(|_| std::io::Error::from(std::io::ErrorKind::InvalidInput))?;

        kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(std::io::Error::from)?;

        Ok(())
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> Result<(), OcdError> {
        self.child.kill().map_err(OcdError::from)
    }
}
