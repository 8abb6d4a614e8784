//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService / DispenseController (domain)
//! ```
//!
//! Driven adapters (load cell, pump, LED, MQTT, Wi-Fi, clock) implement these
//! traits.  The domain holds them behind `Arc<dyn …>` so the same instance can
//! be shared between the dispatcher, the alarm scanner, fill runs and the
//! status publisher.  Every method therefore takes `&self`; adapters
//! serialise internally.

use chrono::NaiveDateTime;

// ───────────────────────────────────────────────────────────────
// Weight port (driven adapter: load cell → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the bowl scale.
pub trait WeightSource: Send + Sync {
    /// Current weight in grams.  Every call records one history sample.
    fn read_grams(&self) -> i32;

    /// Capture the current raw reading as the zero reference.
    fn tare(&self);
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → pump)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the single pump.  Both commands are idempotent.
pub trait ActuatorPort: Send + Sync {
    fn motor_on(&self);

    fn motor_off(&self);

    fn is_motor_on(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → status LED)
// ───────────────────────────────────────────────────────────────

/// Visible feedback.  Best-effort, never fails.
pub trait IndicatorPort: Send + Sync {
    /// Fault pattern (stalled fill).
    fn indicate_fault(&self);

    /// Single acknowledgement blink.
    fn indicate_event(&self);

    fn is_led_on(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Panel inputs (driven adapter: button + tank switch → domain)
// ───────────────────────────────────────────────────────────────

pub trait PanelPort: Send + Sync {
    fn is_button_pressed(&self) -> bool;

    /// True while the supply tank reads below 30 %.
    fn is_tank_low(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Messaging port (driven adapter: domain → MQTT)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget delivery of a UTF-8 payload to a named topic.
pub trait PublishPort: Send + Sync {
    fn publish(&self, topic: &str, payload: &str);
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: domain → Wi-Fi)
// ───────────────────────────────────────────────────────────────

pub trait ConnectivityPort: Send + Sync {
    fn is_connected(&self) -> bool;

    /// One reconnect attempt.  Returns `true` once the link is up.
    fn reconnect(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: domain → clock)
// ───────────────────────────────────────────────────────────────

/// Wall clock, monotonic clock and sleeping.
///
/// The fill loop and the scanners take all their timing from here, which
/// lets tests drive them with virtual time.
pub trait TimePort: Send + Sync {
    /// Local wall-clock time with calendar fields.
    fn now(&self) -> NaiveDateTime;

    /// Monotonic milliseconds since boot.
    fn uptime_ms(&self) -> u64;

    fn sleep_ms(&self, ms: u32);

    /// Set the wall clock.
    fn set_wall_clock(&self, t: NaiveDateTime);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples the alarm scanner from dispensing)
// ───────────────────────────────────────────────────────────────

/// Callback the alarm scanner invokes for each fired alarm.
///
/// The scanner knows nothing about pumps or fill tasks; the composition
/// root forwards fired alarms to the dispense controller.  Always called
/// with the registry lock released.
pub trait SchedulerDelegate: Send + Sync {
    fn on_alarm_fired(&self, target_weight_grams: i32);
}
