//! GPIO pin assignments for the HydraPet main board.
//!
//! Every driver references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Load cell amplifier (HX711)
// ---------------------------------------------------------------------------

/// Digital input: DOUT. LOW = conversion ready.
pub const HX711_DATA_GPIO: i32 = 21;
/// Digital output: PD_SCK serial clock.
pub const HX711_SCK_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// Pump motor (relay / MOSFET, active HIGH)
// ---------------------------------------------------------------------------

pub const MOTOR_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// Status LED (active HIGH)
// ---------------------------------------------------------------------------

pub const LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Supply tank level switch (internal pull-up)
// ---------------------------------------------------------------------------

/// Digital input: HIGH = water below 30 %.
pub const TANK_LEVEL_GPIO: i32 = 10;

// ---------------------------------------------------------------------------
// User button (active-low with internal pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button, reported in the status document.
pub const BUTTON_GPIO: i32 = 9;
