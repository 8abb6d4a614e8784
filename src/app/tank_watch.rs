//! Supply tank watcher.
//!
//! Polls the tank switch and reacts to the moment the supply drops below
//! 30 %: bring the network back if it is down, blink once, publish the tank
//! level.  Only the ok → low transition triggers a report.  The watcher
//! starts out assuming a low tank, so a tank that is already low at boot is
//! first reported by the periodic status publisher.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use super::ports::{ConnectivityPort, IndicatorPort, PanelPort, TimePort};
use super::service::AppService;
use crate::config::SystemConfig;

pub struct TankWatcher {
    service: Arc<AppService>,
    panel: Arc<dyn PanelPort>,
    link: Arc<dyn ConnectivityPort>,
    indicator: Arc<dyn IndicatorPort>,
    clock: Arc<dyn TimePort>,
    was_low: AtomicBool,
    poll_interval_ms: u32,
    reconnect_retry_ms: u32,
}

impl TankWatcher {
    pub fn new(
        service: Arc<AppService>,
        panel: Arc<dyn PanelPort>,
        link: Arc<dyn ConnectivityPort>,
        indicator: Arc<dyn IndicatorPort>,
        clock: Arc<dyn TimePort>,
        config: &SystemConfig,
    ) -> Self {
        Self {
            service,
            panel,
            link,
            indicator,
            clock,
            was_low: AtomicBool::new(true),
            poll_interval_ms: config.tank_poll_interval_ms,
            reconnect_retry_ms: config.reconnect_retry_ms,
        }
    }

    fn ensure_link(&self) {
        if self.link.is_connected() {
            return;
        }
        warn!("Tank: network not connected, reconnecting");
        while !self.link.reconnect() {
            self.clock.sleep_ms(self.reconnect_retry_ms);
        }
    }

    /// Sample the switch once.  Returns `true` when a drop below 30 % was
    /// detected and reported.
    pub fn poll_once(&self) -> bool {
        let low = self.panel.is_tank_low();
        let was_low = self.was_low.swap(low, Ordering::AcqRel);
        if !low || was_low {
            return false;
        }

        info!("Tank: water level is below 30%");
        self.ensure_link();
        self.indicator.indicate_event();
        self.service.publish_tank_level();
        true
    }

    /// Watcher task body.  Never returns.
    pub fn run(&self) -> ! {
        info!("Tank: watcher started ({} ms poll)", self.poll_interval_ms);
        loop {
            self.poll_once();
            self.clock.sleep_ms(self.poll_interval_ms);
        }
    }
}
