//! Property tests for team state membership and the radio datagram codec.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use fieldstate::__internal::{
    decode_message, encode_message, MessageBody, RadioMessage, MAX_DATAGRAM_SIZE,
};
use fieldstate::{PlayerId, RadioCommand, TeamState};
use proptest::prelude::*;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
enum Op {
    Add(u8),
    Remove(u8),
    SetBattery(u8, u8),
    Invalidate,
    Rename,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..12).prop_map(Op::Add),
        2 => (0u8..12).prop_map(Op::Remove),
        3 => (0u8..12, any::<u8>()).prop_map(|(id, charge)| Op::SetBattery(id, charge)),
        1 => Just(Op::Invalidate),
        1 => Just(Op::Rename),
    ]
}

fn command() -> impl Strategy<Value = RadioCommand> {
    (any::<u8>(), any::<u8>(), any::<u8>(), any::<bool>()).prop_flat_map(
        |(team, player, charge, enabled)| {
            let player = PlayerId::new(player);
            prop_oneof![
                Just(RadioCommand::BatteryCharge {
                    team,
                    player,
                    charge
                }),
                Just(RadioCommand::CapacitorCharge {
                    team,
                    player,
                    charge
                }),
                Just(RadioCommand::DribbleStatus {
                    team,
                    player,
                    enabled
                }),
                Just(RadioCommand::KickStatus {
                    team,
                    player,
                    enabled
                }),
            ]
        },
    )
}

proptest! {
    /// The player list always matches a simple set model, every table has exactly one
    /// slot per visible player, and players outside the set read as sentinels.
    #[test]
    fn membership_matches_set_model(ops in proptest::collection::vec(op(), 0..64)) {
        let team = TeamState::new(1, "Blue");
        let mut members = BTreeSet::new();
        let mut team_valid = true;
        let mut charges = std::collections::BTreeMap::new();

        for op in ops {
            match op {
                Op::Add(id) => {
                    // stored even while the team is invalid, visible once it is renamed
                    team.add_player(PlayerId::new(id));
                    members.insert(id);
                    charges.insert(id, 0u8);
                },
                Op::Remove(id) => {
                    team.remove_player(PlayerId::new(id));
                    members.remove(&id);
                    charges.remove(&id);
                },
                Op::SetBattery(id, charge) => {
                    team.set_player_battery_charge(PlayerId::new(id), charge);
                    if team_valid {
                        if let Some(slot) = charges.get_mut(&id) {
                            *slot = charge;
                        }
                    }
                },
                Op::Invalidate => {
                    team.set_invalid();
                    team_valid = false;
                    members.clear();
                    charges.clear();
                },
                Op::Rename => {
                    team.set_name("Blue");
                    team_valid = true;
                },
            }
        }

        let listed: Vec<u8> = team.players().iter().map(|p| p.as_u8()).collect();
        let expected: Vec<u8> = if team_valid {
            members.iter().copied().collect()
        } else {
            Vec::new()
        };
        prop_assert_eq!(listed, expected);

        for id in 0u8..12 {
            let visible = team_valid && members.contains(&id);
            let expected_charge = if visible { charges.get(&id).copied().unwrap_or(0) } else { 0 };
            prop_assert_eq!(team.battery_charge(PlayerId::new(id)), expected_charge);
        }
    }

    /// Writes for players that were never added never allocate storage.
    #[test]
    fn writes_to_unknown_players_never_allocate(ids in proptest::collection::vec(any::<u8>(), 0..32)) {
        let team = TeamState::new(1, "Blue");
        for id in ids {
            team.set_player_battery_charge(PlayerId::new(id), 1);
            team.set_player_kick_status(PlayerId::new(id), true);
        }
        for (_, slots) in team.store().slot_counts() {
            prop_assert_eq!(slots, 0);
        }
    }

    /// Every command fits one datagram and decodes to itself.
    #[test]
    fn commands_fit_one_datagram(command in command()) {
        let bytes = encode_message(&RadioMessage::command(command)).unwrap();
        prop_assert!(bytes.len() <= MAX_DATAGRAM_SIZE);
        let decoded = decode_message(&bytes).unwrap();
        prop_assert_eq!(decoded.body, MessageBody::Command(command));
    }

    /// Arbitrary bytes never panic the decoder.
    #[test]
    fn decoder_survives_garbage(bytes in proptest::collection::vec(any::<u8>(), 0..MAX_DATAGRAM_SIZE)) {
        let _ = decode_message(&bytes);
    }
}
