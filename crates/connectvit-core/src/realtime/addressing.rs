//! Conversation addressing.
//!
//! Maps a conversation (two identities, or one group) to the canonical room id
//! that the registry keys on. Direct rooms live under `dm:` and group rooms
//! under `group:`, so the two namespaces can never collide.

use connectvit_types::error::AddressError;
use connectvit_types::room::{Room, RoomId};

const SEPARATOR: char = ':';
const DIRECT_PREFIX: &str = "dm";
const GROUP_PREFIX: &str = "group";

/// Check that `identity` can be used as an addressing token.
pub fn validate_identity(identity: &str) -> Result<(), AddressError> {
    if identity.is_empty() {
        return Err(AddressError::EmptyIdentity);
    }
    if identity.contains(SEPARATOR) {
        return Err(AddressError::ReservedSeparator(identity.to_string()));
    }
    Ok(())
}

/// Room id for the direct conversation between `a` and `b`.
///
/// Order-independent: the two identities are sorted case-sensitively before
/// joining, so `room_for_direct(a, b) == room_for_direct(b, a)`.
pub fn room_for_direct(a: &str, b: &str) -> Result<RoomId, AddressError> {
    validate_identity(a)?;
    validate_identity(b)?;
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    Ok(RoomId::from_canonical(format!(
        "{DIRECT_PREFIX}{SEPARATOR}{lo}{SEPARATOR}{hi}"
    )))
}

/// Room id for a group conversation.
pub fn room_for_group(group_id: i64) -> RoomId {
    RoomId::from_canonical(format!("{GROUP_PREFIX}{SEPARATOR}{group_id}"))
}

/// Recover the conversation a canonical room id stands for.
pub fn parse_room(room: &RoomId) -> Result<Room, AddressError> {
    let malformed = || AddressError::MalformedRoom(room.to_string());
    let mut parts = room.as_str().split(SEPARATOR);

    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(DIRECT_PREFIX), Some(a), Some(b), None) => {
            validate_identity(a).map_err(|_| malformed())?;
            validate_identity(b).map_err(|_| malformed())?;
            if a > b {
                return Err(malformed());
            }
            Ok(Room::Direct {
                a: a.to_string(),
                b: b.to_string(),
            })
        }
        (Some(GROUP_PREFIX), Some(id), None, None) => {
            let group_id = id.parse::<i64>().map_err(|_| malformed())?;
            Ok(Room::Group { group_id })
        }
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITIES: &[&str] = &[
        "alice", "bob", "Bob", "b", "alice2", "zoë", "22BCE1234", "a-b", "a_b", " ",
    ];

    #[test]
    fn direct_room_is_order_independent() {
        for a in IDENTITIES {
            for b in IDENTITIES {
                assert_eq!(
                    room_for_direct(a, b).unwrap(),
                    room_for_direct(b, a).unwrap(),
                    "pair ({a}, {b})"
                );
            }
        }
    }

    #[test]
    fn direct_room_format() {
        assert_eq!(room_for_direct("bob", "alice").unwrap().as_str(), "dm:alice:bob");
    }

    #[test]
    fn ordering_is_case_sensitive() {
        // 'B' (0x42) sorts before 'a' (0x61).
        assert_eq!(room_for_direct("alice", "Bob").unwrap().as_str(), "dm:Bob:alice");
        assert_ne!(
            room_for_direct("alice", "bob").unwrap(),
            room_for_direct("alice", "Bob").unwrap()
        );
    }

    #[test]
    fn self_conversation_is_allowed() {
        assert_eq!(room_for_direct("alice", "alice").unwrap().as_str(), "dm:alice:alice");
    }

    #[test]
    fn group_room_never_collides_with_direct_room() {
        for g in [-1_i64, 0, 1, 42, i64::MAX] {
            let group = room_for_group(g);
            for a in IDENTITIES {
                for b in IDENTITIES {
                    assert_ne!(group, room_for_direct(a, b).unwrap());
                }
            }
        }
        // Identities shaped like the group namespace still land under dm:.
        assert_ne!(room_for_group(1), room_for_direct("group", "1").unwrap());
    }

    #[test]
    fn rejects_empty_identity() {
        assert_eq!(room_for_direct("", "bob"), Err(AddressError::EmptyIdentity));
        assert_eq!(room_for_direct("alice", ""), Err(AddressError::EmptyIdentity));
    }

    #[test]
    fn rejects_separator_in_identity() {
        assert!(matches!(
            room_for_direct("al:ice", "bob"),
            Err(AddressError::ReservedSeparator(id)) if id == "al:ice"
        ));
    }

    #[test]
    fn parse_round_trips_direct_and_group() {
        let room = room_for_direct("bob", "alice").unwrap();
        assert_eq!(
            parse_room(&room).unwrap(),
            Room::Direct {
                a: "alice".to_string(),
                b: "bob".to_string()
            }
        );
        assert_eq!(
            parse_room(&room_for_group(9)).unwrap(),
            Room::Group { group_id: 9 }
        );
    }

    #[test]
    fn parse_rejects_non_canonical_ids() {
        for raw in [
            "",
            "dm",
            "dm:alice",
            "dm:bob:alice",
            "dm:alice:bob:carol",
            "dm::bob",
            "group:",
            "group:abc",
            "group:1:2",
            "room:1",
            "alice-bob",
        ] {
            let id = RoomId::from_canonical(raw);
            assert!(
                matches!(parse_room(&id), Err(AddressError::MalformedRoom(_))),
                "{raw} should be rejected"
            );
        }
    }
}
