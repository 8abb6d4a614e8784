//! Periodic status publisher.
//!
//! Every cycle waits for the network, publishes the full status bundle,
//! blinks the LED once and sleeps until the next cycle.  Each cycle takes
//! one weight reading, which also lands in the history ring.

use std::sync::Arc;

use log::{info, warn};

use super::ports::{ConnectivityPort, IndicatorPort, TimePort};
use super::service::AppService;
use crate::config::SystemConfig;

pub struct StatusPublisher {
    service: Arc<AppService>,
    link: Arc<dyn ConnectivityPort>,
    indicator: Arc<dyn IndicatorPort>,
    clock: Arc<dyn TimePort>,
    interval_ms: u32,
    connectivity_retry_ms: u32,
}

impl StatusPublisher {
    pub fn new(
        service: Arc<AppService>,
        link: Arc<dyn ConnectivityPort>,
        indicator: Arc<dyn IndicatorPort>,
        clock: Arc<dyn TimePort>,
        config: &SystemConfig,
    ) -> Self {
        Self {
            service,
            link,
            indicator,
            clock,
            interval_ms: config.status_interval_secs.saturating_mul(1000),
            connectivity_retry_ms: config.connectivity_retry_ms,
        }
    }

    /// Block until the link is up, checking every retry interval.
    fn wait_for_link(&self) {
        while !self.link.is_connected() {
            warn!("Status: network not connected, waiting...");
            self.clock.sleep_ms(self.connectivity_retry_ms);
        }
    }

    /// One publish cycle without the trailing sleep.
    pub fn publish_once(&self) {
        self.wait_for_link();
        self.service.publish_status();
        self.indicator.indicate_event();
    }

    /// Publisher task body.  Never returns.
    pub fn run(&self) -> ! {
        info!("Status: publisher started ({} s interval)", self.interval_ms / 1000);
        loop {
            self.publish_once();
            self.clock.sleep_ms(self.interval_ms);
        }
    }
}
