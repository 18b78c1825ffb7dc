//! Integration test: command stream → node → result stream.
//!
//! Validates the reference quad scenario end to end over both stream
//! formats, the reader-thread bridge, and one-result-per-command ordering.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mc_common::mixer::config::MixOptions;
use mc_common::mixer::error::MixFault;
use mc_common::mixer::geometry::FramePreset;
use mc_common::mixer::types::ControlInputVector;
use mc_common::mixer::wire::{AttitudeCommandMsg, QuadMixerOutMsg, decode_throttles, parse_throttle_json};
use mc_mixer::mix::MixingEngine;
use mc_mixer::node::{MixerNode, StepResult};
use mc_mixer::transport::channel::{command_channel, result_channel, spawn_reader};
use mc_mixer::transport::stream::{
    BinaryFrameSink, BinaryFrameSource, JsonLinesSink, JsonLinesSource,
};

const TOL: f32 = 1e-6;

fn quad_engine() -> MixingEngine {
    MixingEngine::new(FramePreset::QuadPlus.table(), MixOptions::default())
}

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() < TOL, "rotor {i}: {a} != {e}");
    }
}

#[test]
fn reference_scenario_over_json_lines() {
    let input = concat!(
        "{\"roll\":1.0,\"pitch\":0.0,\"yaw\":0.0,\"thrust\":0.5}\n",
        "{\"roll\":0.0,\"pitch\":0.0,\"yaw\":0.0,\"thrust\":0.5}\n",
    );
    let source = JsonLinesSource::new("actuators_0", Cursor::new(input));
    let sink = JsonLinesSink::new("mixer_out", Vec::new());
    let mut node = MixerNode::new(quad_engine(), source, sink);

    let stats = node.spin().unwrap().clone();
    assert_eq!(stats.mixed, 2);
    assert_eq!(stats.roll_pitch_limited, 1);
    assert_eq!(stats.saturation_faults, 0);

    let snap = node.last_snapshot().unwrap();
    assert_eq!(snap.input, ControlInputVector::new(0.0, 0.0, 0.0, 0.5));

    let (_, sink) = node.into_parts();
    let text = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    let out = parse_throttle_json(&first, 4).unwrap();
    assert_close(out.as_slice(), &[0.0, 1.0, 0.5, 0.5]);

    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_close(parse_throttle_json(&second, 4).unwrap().as_slice(), &[0.5; 4]);
}

#[test]
fn reference_scenario_over_binary_frames() {
    let cmd = AttitudeCommandMsg {
        roll: 1.0,
        pitch: 0.0,
        yaw: 0.0,
        thrust: 0.5,
    };
    let source = BinaryFrameSource::new("actuators_0", Cursor::new(cmd.to_le_bytes().to_vec()));
    let sink = BinaryFrameSink::new("mixer_out", Vec::new());
    let mut node = MixerNode::new(quad_engine(), source, sink);

    assert_eq!(node.step().unwrap(), StepResult::Mixed);
    assert_eq!(node.step().unwrap(), StepResult::EndOfStream);

    let outcome = &node.last_snapshot().unwrap().outcome;
    assert_eq!(outcome.scale_in, Some(0.5));
    assert_eq!(outcome.min_out, -0.5);
    assert_eq!(outcome.max_out, 1.5);
    assert!(outcome.faults.contains(MixFault::ROLL_PITCH_LIMITED | MixFault::THRUST_LIMITED));

    let (_, sink) = node.into_parts();
    let frame = sink.into_inner();
    assert_eq!(frame.len(), 16);
    let out = decode_throttles(&frame).unwrap();
    let msg = QuadMixerOutMsg::try_from(&out).unwrap();
    assert_close(&msg.throttles(), &[0.0, 1.0, 0.5, 0.5]);
}

#[test]
fn malformed_lines_are_dropped_not_fatal() {
    let input = concat!(
        "{\"roll\":0.0,\"pitch\":0.0,\"yaw\":0.0,\"thrust\":0.25}\n",
        "{\"roll\": oops}\n",
        "\n",
        "{\"roll\":0.0,\"pitch\":0.0,\"yaw\":0.0,\"thrust\":0.75}\n",
    );
    let source = JsonLinesSource::new("cmd", Cursor::new(input));
    let (sink, results) = result_channel("out");
    let mut node = MixerNode::new(quad_engine(), source, sink);

    let stats = node.spin().unwrap().clone();
    assert_eq!(stats.mixed, 2);
    assert_eq!(stats.decode_errors, 1);

    let thrusts: Vec<f32> = results.try_iter().map(|o| o.as_slice()[0]).collect();
    assert_eq!(thrusts, vec![0.25, 0.75]);
}

#[test]
fn non_utf8_line_is_dropped_not_fatal() {
    let mut input = b"{\"roll\":0.0,\"pitch\":0.0,\"yaw\":0.0,\"thrust\":0.25}\n".to_vec();
    input.extend_from_slice(b"\xff\xfe garbage\n");
    input.extend_from_slice(b"{\"roll\":0.0,\"pitch\":0.0,\"yaw\":0.0,\"thrust\":0.75}\n");
    let source = JsonLinesSource::new("cmd", Cursor::new(input));
    let (sink, results) = result_channel("out");
    let mut node = MixerNode::new(quad_engine(), source, sink);

    let stats = node.spin().unwrap().clone();
    assert_eq!(stats.mixed, 2);
    assert_eq!(stats.decode_errors, 1);

    let thrusts: Vec<f32> = results.try_iter().map(|o| o.as_slice()[0]).collect();
    assert_eq!(thrusts, vec![0.25, 0.75]);
}

#[test]
fn reader_bridge_preserves_order() {
    let mut input = String::new();
    for i in 0..50 {
        input.push_str(&format!(
            "{{\"roll\":0.0,\"pitch\":0.0,\"yaw\":0.0,\"thrust\":{}}}\n",
            i as f32 / 50.0
        ));
    }
    let (commands, reader) = spawn_reader(JsonLinesSource::new("cmd", Cursor::new(input))).unwrap();
    let (sink, results) = result_channel("out");
    let mut node = MixerNode::new(quad_engine(), commands, sink);

    assert_eq!(node.spin().unwrap().mixed, 50);
    reader.join().unwrap();

    let got: Vec<f32> = results.try_iter().map(|o| o.as_slice()[2]).collect();
    let expected: Vec<f32> = (0..50).map(|i| i as f32 / 50.0).collect();
    assert_close(&got, &expected);
}

#[test]
fn shutdown_flag_stops_blocked_node() {
    let running = Arc::new(AtomicBool::new(true));
    let (tx, source) = command_channel("cmd");
    let (sink, results) = result_channel("out");
    let mut node = MixerNode::new(quad_engine(), source.with_shutdown(running.clone()), sink)
        .with_running_flag(running.clone());

    tx.send(ControlInputVector::new(0.0, 0.0, 0.0, 0.5)).unwrap();
    let handle = std::thread::spawn(move || node.spin().map(|s| s.mixed));

    // Wait for the first result, then stop while the sender is still alive.
    let first = results.recv().unwrap();
    assert_close(first.as_slice(), &[0.5; 4]);
    running.store(false, Ordering::SeqCst);

    assert_eq!(handle.join().unwrap().unwrap(), 1);
    drop(tx);
}

#[test]
fn one_engine_shared_across_nodes() {
    let engine = Arc::new(quad_engine());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                let roll = i as f32 * 0.25;
                engine.mix(&ControlInputVector::new(roll, 0.0, 0.0, 0.5))
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        let outcome = h.join().unwrap();
        let roll = i as f32 * 0.25;
        assert_eq!(outcome, engine.mix(&ControlInputVector::new(roll, 0.0, 0.0, 0.5)));
    }
}
