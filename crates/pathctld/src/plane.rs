//! Log-only forwarding plane.

use async_trait::async_trait;
use log::debug;
use pathctl_common::{DispatchError, FlowRule, ForwardingPlane, OutputAction};
use pathctl_types::Dpid;
use std::sync::Arc;

/// A [`ForwardingPlane`] that logs every dispatch and succeeds.
///
/// Used by the standalone binary when no switch transport is attached,
/// so the whole decision pipeline can run and be observed from the log.
#[derive(Debug, Default)]
pub struct LoggingPlane;

#[async_trait]
impl ForwardingPlane for LoggingPlane {
    async fn install_rule(&self, rule: &FlowRule) -> Result<(), DispatchError> {
        debug!("plane: install {}", rule);
        Ok(())
    }

    async fn emit_frame(
        &self,
        dpid: Dpid,
        action: OutputAction,
        payload: Arc<Vec<u8>>,
    ) -> Result<(), DispatchError> {
        debug!("plane: emit {} bytes on {} ({})", payload.len(), dpid, action);
        Ok(())
    }
}
