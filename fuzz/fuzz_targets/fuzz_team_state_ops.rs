//! Fuzz target for TeamState operation sequences.
//!
//! After any sequence of operations, a valid team holds exactly one slot per listed
//! player in every attribute table, and unlisted players read as sentinels.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use fieldstate::{PlayerId, Position, RadioSensorApi, RadioSensorHandler, TeamDirectory, TeamState};
use std::sync::Arc;

#[derive(Debug, Arbitrary)]
enum Op {
    Add(u8),
    Remove(u8),
    SetPosition(u8, f32, f32),
    SetBattery(u8, u8),
    InboundKick(u8, u8, bool),
    Invalidate,
    Renumber(u8),
}

fuzz_target!(|ops: Vec<Op>| {
    let directory = Arc::new(TeamDirectory::new());
    let team = Arc::new(TeamState::new(1, "Blue"));
    directory.insert(team.clone());
    let handler = RadioSensorHandler::new(directory);

    for op in ops.iter().take(256) {
        match *op {
            Op::Add(id) => team.add_player(PlayerId::new(id)),
            Op::Remove(id) => team.remove_player(PlayerId::new(id)),
            Op::SetPosition(id, x, y) => team.set_position(PlayerId::new(id), Position::new(x, y)),
            Op::SetBattery(id, charge) => team.set_player_battery_charge(PlayerId::new(id), charge),
            Op::InboundKick(team_number, id, enabled) => {
                handler.set_player_kick_status(team_number, PlayerId::new(id), enabled)
            },
            Op::Invalidate => team.set_invalid(),
            Op::Renumber(number) => team.set_number(number),
        }
    }

    let players = team.players();
    for id in 0..=u8::MAX {
        let id = PlayerId::new(id);
        if !players.contains(&id) {
            assert!(!team.position(id).valid);
            assert_eq!(team.battery_charge(id), 0);
            assert!(!team.kick_enabled(id));
        }
    }
});
