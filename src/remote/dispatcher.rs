//! External-message dispatcher task.
//!
//! Receives inbound MQTT messages from the channel, decodes them, and hands
//! the resulting commands to the [`AppService`].  Decode failures and
//! rejected requests are logged here and go no further.

use std::sync::Arc;

use futures_lite::future::block_on;
use log::{debug, info, warn};

use super::channels::{InboundChannel, InboundMsg};
use super::codec;
use crate::app::service::AppService;

pub struct Dispatcher {
    service: Arc<AppService>,
    default_alarm_target: i32,
}

impl Dispatcher {
    pub fn new(service: Arc<AppService>, default_alarm_target: i32) -> Self {
        Self {
            service,
            default_alarm_target,
        }
    }

    /// Decode and execute one message.  Returns `true` when the request was
    /// carried out.
    pub fn handle(&self, msg: &InboundMsg) -> bool {
        let Some(suffix) = self.service.topics().route(&msg.topic) else {
            debug!("Dispatch: ignoring foreign topic '{}'", msg.topic);
            return false;
        };

        let cmd = match codec::decode(suffix, &msg.payload, self.default_alarm_target) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("Dispatch: {} on '{}': {:?}", e, suffix, msg.payload.as_str());
                return false;
            }
        };

        info!("Dispatch: {} -> {:?}", suffix, cmd);
        match self.service.handle_command(cmd) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dispatch: {} rejected: {}", suffix, e);
                false
            }
        }
    }

    /// Dispatcher task body.  Never returns.
    pub fn run(&self, channel: &InboundChannel) -> ! {
        info!("Dispatch: waiting for messages");
        loop {
            let msg = block_on(channel.receive());
            self.handle(&msg);
        }
    }
}
