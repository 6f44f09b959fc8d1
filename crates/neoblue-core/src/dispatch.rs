// ── Command dispatch ──
//
// One command, one short-lived link. No queue: concurrent commands for the
// same address line up on the supervisor's gate, so the second one is only
// written after the first link is closed.

use std::sync::Arc;
use std::time::Duration;

use neoblue_api::{Command, DeviceAddress, RadioStack, Transport};
use tracing::{debug, info, warn};

use crate::config::CoordinatorConfig;
use crate::error::CoreError;
use crate::supervisor::ConnectionSupervisor;

pub struct CommandDispatcher {
    radio: Arc<dyn RadioStack>,
    transport: Arc<dyn Transport>,
    supervisor: Arc<ConnectionSupervisor>,
    command_timeout: Duration,
}

impl CommandDispatcher {
    pub fn new(
        radio: Arc<dyn RadioStack>,
        transport: Arc<dyn Transport>,
        supervisor: Arc<ConnectionSupervisor>,
        config: &CoordinatorConfig,
    ) -> Self {
        Self {
            radio,
            transport,
            supervisor,
            command_timeout: config.command_timeout,
        }
    }

    /// Deliver `command` to `address` over a dedicated link.
    ///
    /// Returns once the link is closed. A device the radio cannot see at
    /// all is rejected up front with [`CoreError::DeviceUnavailable`]
    /// without spending the connect timeout.
    pub async fn send(&self, address: &DeviceAddress, command: Command) -> Result<(), CoreError> {
        if !self.radio.is_present(address) {
            warn!(%address, command = command.kind(), "device not present, command not sent");
            return Err(CoreError::DeviceUnavailable {
                address: address.clone(),
            });
        }

        debug!(%address, %command, "dispatching command");

        let transport = Arc::clone(&self.transport);
        let timeout = self.command_timeout;
        let target = address.clone();

        let result = self
            .supervisor
            .with_connection(address, move |handle| {
                Box::pin(async move {
                    match tokio::time::timeout(timeout, transport.write_command(handle, &command))
                        .await
                    {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(e)) => Err(CoreError::transport(&target, &e)),
                        Err(_) => Err(CoreError::CommandTimeout {
                            address: target,
                            timeout,
                        }),
                    }
                })
            })
            .await;

        match &result {
            Ok(()) => info!(%address, %command, "command sent"),
            Err(e) => warn!(%address, command = command.kind(), error = %e, "command failed"),
        }
        result
    }
}
