//! wodman-lib: WSL plumbing for running podman on Windows.
//!
//! This crate provides:
//! - `native`: a bridge to Windows native interfaces (cached symbol lookup,
//!   HRESULT decoding, known folder resolution)
//! - `wsl`: the lifecycle of the podman WSL distribution (detect, import, launch)
//! - `config`: layered configuration (defaults, `containers.conf`, `PODMAN_*`)
//! - `env`: environment variable expansion for configured paths

pub mod config;
pub mod consts;
pub mod env;
pub mod native;
pub mod wsl;
