//! Rule installer - turns computed paths into per-switch forwarding rules.

mod installer;

pub use installer::{output_port_at, FlowInstaller, FlowInstallerConfig, InstallReport, InstallerStats};
