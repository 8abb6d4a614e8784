//! Fuzz target: inbound MQTT message handling
//!
//! Splits arbitrary bytes into a topic and a payload, pushes them through
//! the bounded inbound buffer and the request decoder, and asserts that
//! nothing panics and that accepted requests carry sane values.
//!
//! cargo fuzz run fuzz_mqtt_decode

#![no_main]

use hydrapet::app::commands::AppCommand;
use hydrapet::remote::channels::{InboundMsg, PAYLOAD_CAPACITY, TOPIC_CAPACITY};
use hydrapet::remote::codec;
use hydrapet::remote::topics::Topics;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let (topic, payload) = rest.split_at(usize::from(split).min(rest.len()));
    let Ok(topic) = core::str::from_utf8(topic) else {
        return;
    };

    let Some(msg) = InboundMsg::new(topic, payload) else {
        return;
    };
    assert!(msg.topic.len() <= TOPIC_CAPACITY);
    assert!(msg.payload.len() <= PAYLOAD_CAPACITY);

    let topics = Topics::new("hydrapet0001");
    let suffix = topics.route(&msg.topic).unwrap_or(&msg.topic);
    match codec::decode(suffix, &msg.payload, 200) {
        Ok(AppCommand::Fill { target_grams }) => assert!(target_grams > 0),
        Ok(AppCommand::SetAlarm(alarm)) => assert!(alarm.target_weight_grams > 0),
        _ => {}
    }
});
