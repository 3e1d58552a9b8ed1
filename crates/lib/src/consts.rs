/// Default name of the WSL distribution that hosts podman.
pub const DEFAULT_DISTRO: &str = "podman";

/// Default loopback TCP port the podman service listens on.
pub const DEFAULT_PORT: u16 = 1234;

/// Default install location; expanded at import time.
pub const DEFAULT_DISTRO_PATH: &str = "${LOCALAPPDATA}/podman";

/// Prefix for environment variables overriding configuration.
pub const ENV_PREFIX: &str = "PODMAN_";

/// Service binary inside the distribution.
pub const SERVICE_BINARY: &str = "/usr/bin/podman";

/// Loopback address the service binds to.
pub const SERVICE_HOST: &str = "127.0.0.1";
