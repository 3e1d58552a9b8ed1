//! Fire-and-forget process launches.

use std::fmt;

/// A process that was started and left running.
///
/// Holding one only means the launch was accepted by the OS. The service
/// inside may still be starting, or may already have failed; callers that
/// need it ready have to poll its endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchHandle {
  pid: Option<u32>,
  command: String,
}

impl LaunchHandle {
  pub fn new(pid: Option<u32>, command: impl Into<String>) -> Self {
    Self {
      pid,
      command: command.into(),
    }
  }

  /// OS process id, if the platform reported one.
  pub fn pid(&self) -> Option<u32> {
    self.pid
  }

  pub fn command(&self) -> &str {
    &self.command
  }
}

impl fmt::Display for LaunchHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.pid {
      Some(pid) => write!(f, "{} (pid {})", self.command, pid),
      None => write!(f, "{}", self.command),
    }
  }
}
